use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use transitionu_api::auth::{self, AppState, AppStateInner};
use transitionu_api::middleware::require_auth;
use transitionu_api::{achievements, checklist, faq, forum, guides, messaging, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transitionu=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("TRANSITIONU_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("TRANSITIONU_DB_PATH").unwrap_or_else(|_| "transitionu.db".into());
    let host = std::env::var("TRANSITIONU_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("TRANSITIONU_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and reference content
    let db = transitionu_db::Database::open(&PathBuf::from(&db_path))?;
    db.seed()?;

    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/me", get(users::get_me))
        .route("/me", patch(users::update_me))
        .route("/checklist/categories", get(checklist::get_categories))
        .route(
            "/checklist/categories/{category_id}/items",
            get(checklist::get_category_items),
        )
        .route("/checklist/items", get(checklist::get_items))
        .route(
            "/checklist/items/{item_id}/progress",
            put(checklist::update_progress),
        )
        .route("/checklist/summary", get(checklist::get_summary))
        .route("/forum/posts", get(forum::list_posts))
        .route("/forum/posts", post(forum::create_post))
        .route("/forum/posts/search", get(forum::search_posts))
        .route("/forum/posts/{post_id}", get(forum::get_post))
        .route("/forum/posts/{post_id}", delete(forum::delete_post))
        .route("/forum/posts/{post_id}/vote", post(forum::vote_post))
        .route("/forum/posts/{post_id}/replies", get(forum::list_replies))
        .route("/forum/posts/{post_id}/replies", post(forum::create_reply))
        .route("/forum/replies/{reply_id}", delete(forum::delete_reply))
        .route("/forum/replies/{reply_id}/vote", post(forum::vote_reply))
        .route("/faq", get(faq::list_faqs))
        .route("/faq/{faq_id}", get(faq::get_faq))
        .route("/guides/categories", get(guides::get_categories))
        .route(
            "/guides/categories/{category_id}",
            get(guides::get_category_guides),
        )
        .route("/guides/personalized", get(guides::personalized_guides))
        .route("/guides/{guide_id}", get(guides::get_guide))
        .route("/achievements", get(achievements::list_achievements))
        .route(
            "/achievements/earned",
            get(achievements::earned_achievements),
        )
        .route("/conversations", get(messaging::list_conversations))
        .route("/conversations", post(messaging::open_conversation))
        .route(
            "/conversations/{conversation_id}/messages",
            get(messaging::conversation_messages),
        )
        .route("/messages", post(messaging::send_message))
        .route("/messages/unread", get(messaging::unread_count))
        .route("/messages/{message_id}/read", post(messaging::mark_read))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("TransitionU server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
