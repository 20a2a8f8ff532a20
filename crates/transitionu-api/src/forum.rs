use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use transitionu_db::models::{PostStatsRow, ReplyRow};
use transitionu_db::queries::forum::PostFilter;
use transitionu_types::api::{
    Claims, CreatePostRequest, CreateReplyRequest, PostListQuery, PostResponse, ReplyResponse,
    SearchQuery, VoteRequest, VoteResponse,
};
use transitionu_types::models::VoteType;

use crate::achievements::check_and_award;
use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

const MAX_PAGE: u32 = 100;

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required"));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content is required"));
    }

    let post_id = Uuid::new_v4();
    let user_id = claims.sub.to_string();
    state.db.create_post(
        &post_id.to_string(),
        Some(&user_id),
        req.title.trim(),
        &req.content,
        req.category.as_str(),
        req.anonymous,
    )?;

    if let Err(e) = check_and_award(&state.db, &user_id) {
        error!("Achievement check failed for {}: {:#}", claims.sub, e);
    }

    let post = state
        .db
        .get_post(&post_id.to_string(), Some(&user_id))?
        .ok_or_else(|| anyhow::anyhow!("post vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(to_post_response(post))))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = tokio::task::spawn_blocking(move || {
        let viewer = claims.sub.to_string();
        let author = query.author.map(|a| a.to_string());
        state.db.get_posts(&PostFilter {
            category: query.category.map(|c| c.as_str()),
            author: author.as_deref(),
            sort_by: query.sort_by,
            order: query.order,
            limit: query.limit.min(MAX_PAGE),
            offset: query.offset,
            viewer: Some(&viewer),
        })
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let response: Vec<PostResponse> = posts.into_iter().map(to_post_response).collect();
    Ok(Json(response))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .get_post(&post_id.to_string(), Some(&claims.sub.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_post_response(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .db
        .get_post(&post_id.to_string(), None)?
        .ok_or(ApiError::NotFound)?;

    if post.user_id.as_deref() != Some(claims.sub.to_string().as_str()) {
        return Err(ApiError::Forbidden);
    }

    state.db.delete_post(&post_id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's vote. The response carries only the vote now in
/// effect; clients re-fetch the post for fresh counts.
pub async fn vote_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_post(&post_id.to_string(), None)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let active = state.db.toggle_post_vote(
        &post_id.to_string(),
        &claims.sub.to_string(),
        req.vote_type,
    )?;
    Ok(Json(VoteResponse { vote: active }))
}

pub async fn vote_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_reply(&reply_id.to_string())?.is_none() {
        return Err(ApiError::NotFound);
    }

    let active = state.db.toggle_reply_vote(
        &reply_id.to_string(),
        &claims.sub.to_string(),
        req.vote_type,
    )?;
    Ok(Json(VoteResponse { vote: active }))
}

pub async fn create_reply(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("content is required"));
    }
    if state.db.get_post(&post_id.to_string(), None)?.is_none() {
        return Err(ApiError::NotFound);
    }

    // replies nest one level: the parent must belong to this post and be
    // a top-level reply itself
    let parent = match req.parent_reply_id {
        None => None,
        Some(parent_id) => {
            let parent = state
                .db
                .get_reply(&parent_id.to_string())?
                .ok_or(ApiError::NotFound)?;
            if parent.post_id != post_id.to_string() || parent.parent_reply_id.is_some() {
                return Err(ApiError::Validation("cannot reply to that comment"));
            }
            Some(parent_id.to_string())
        }
    };

    let reply_id = Uuid::new_v4();
    let user_id = claims.sub.to_string();
    state.db.create_reply(
        &reply_id.to_string(),
        &post_id.to_string(),
        Some(&user_id),
        parent.as_deref(),
        &req.content,
        req.anonymous,
    )?;

    if let Err(e) = check_and_award(&state.db, &user_id) {
        error!("Achievement check failed for {}: {:#}", claims.sub, e);
    }

    let reply = state
        .db
        .get_reply(&reply_id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("reply vanished after insert"))?;
    Ok((StatusCode::CREATED, Json(to_reply_response(reply))))
}

pub async fn list_replies(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.db.get_post(&post_id.to_string(), None)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let replies = state.db.get_replies(&post_id.to_string())?;
    let response: Vec<ReplyResponse> = replies.into_iter().map(to_reply_response).collect();
    Ok(Json(response))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    Path(reply_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .db
        .get_reply(&reply_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if reply.user_id.as_deref() != Some(claims.sub.to_string().as_str()) {
        return Err(ApiError::Forbidden);
    }

    state.db.delete_reply(&reply_id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = tokio::task::spawn_blocking(move || {
        let viewer = claims.sub.to_string();
        state
            .db
            .search_posts(&query.q, query.limit.min(MAX_PAGE), Some(&viewer))
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let response: Vec<PostResponse> = posts.into_iter().map(to_post_response).collect();
    Ok(Json(response))
}

fn to_post_response(post: PostStatsRow) -> PostResponse {
    PostResponse {
        id: parse_uuid(&post.id, "post id"),
        user_id: post.user_id.map(|u| parse_uuid(&u, "post author id")),
        author_name: post.author_name,
        title: post.title,
        content: post.content,
        category: post.category,
        anonymous: post.anonymous,
        upvotes: post.upvotes,
        downvotes: post.downvotes,
        reply_count: post.reply_count,
        user_vote: post.user_vote.as_deref().and_then(VoteType::parse),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn to_reply_response(reply: ReplyRow) -> ReplyResponse {
    ReplyResponse {
        id: parse_uuid(&reply.id, "reply id"),
        post_id: parse_uuid(&reply.post_id, "reply post id"),
        user_id: reply.user_id.map(|u| parse_uuid(&u, "reply author id")),
        author_name: reply.author_name,
        parent_reply_id: reply
            .parent_reply_id
            .map(|p| parse_uuid(&p, "parent reply id")),
        content: reply.content,
        anonymous: reply.anonymous,
        upvotes: reply.upvotes,
        downvotes: reply.downvotes,
        created_at: reply.created_at,
    }
}
