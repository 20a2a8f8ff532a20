use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use transitionu_db::models::ItemWithProgress;
use transitionu_types::api::{
    ChecklistCategoryResponse, ChecklistItemWithProgress, ChecklistSummaryResponse, Claims,
    ProgressInfo, UpdateProgressRequest,
};
use transitionu_types::models::ChecklistStatus;
use transitionu_types::progress;

use crate::achievements::check_and_award;
use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

#[derive(Debug, Deserialize)]
pub struct VisaQuery {
    pub visa_type: Option<String>,
}

pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.db.get_checklist_categories()?;
    let response: Vec<ChecklistCategoryResponse> = categories
        .into_iter()
        .map(|c| ChecklistCategoryResponse {
            id: parse_uuid(&c.id, "category id"),
            name: c.name,
            description: c.description,
            display_order: c.display_order,
        })
        .collect();
    Ok(Json(response))
}

/// All checklist items joined with the caller's progress. The visa filter
/// comes from the query string, falling back to the caller's profile.
pub async fn get_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<VisaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = fetch_items_with_progress(state, claims.sub, query.visa_type).await?;
    Ok(Json(items))
}

pub async fn get_category_items(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let items = fetch_items_with_progress(state, claims.sub, None).await?;
    let scoped: Vec<ChecklistItemWithProgress> = items
        .into_iter()
        .filter(|i| i.category_id == Some(category_id))
        .collect();
    Ok(Json(scoped))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // the item must exist; progress rows are never created for phantom items
    if !state.db.checklist_item_exists(&item_id.to_string())? {
        return Err(ApiError::NotFound);
    }

    let row = state.db.update_progress(
        &claims.sub.to_string(),
        &item_id.to_string(),
        req.status,
        req.notes.as_deref(),
    )?;

    if req.status == ChecklistStatus::Completed {
        match check_and_award(&state.db, &claims.sub.to_string()) {
            Ok(newly) if !newly.is_empty() => {
                info!("User {} earned achievements: {:?}", claims.sub, newly)
            }
            Ok(_) => {}
            // progress already saved; a failed award check must not fail the update
            Err(e) => error!("Achievement check failed for {}: {:#}", claims.sub, e),
        }
    }

    Ok(Json(ProgressInfo {
        status: row.status,
        notes: row.notes,
        completed_at: row.completed_at,
    }))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<VisaQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = fetch_items_with_progress(state, claims.sub, query.visa_type).await?;
    let (categories, overall) = progress::summarize(&items);
    Ok(Json(ChecklistSummaryResponse {
        categories,
        overall,
    }))
}

/// Runs the aggregator off the async runtime and resolves the visa filter
/// from the caller's profile when the request does not name one.
async fn fetch_items_with_progress(
    state: AppState,
    user_id: Uuid,
    visa_type: Option<String>,
) -> Result<Vec<ChecklistItemWithProgress>, ApiError> {
    let rows = tokio::task::spawn_blocking(move || {
        let uid = user_id.to_string();
        let visa_type = match visa_type {
            Some(vt) => Some(vt),
            None => state.db.get_user_by_id(&uid)?.and_then(|u| u.visa_type),
        };
        state.db.items_with_progress(&uid, visa_type.as_deref())
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(rows.into_iter().map(to_response).collect())
}

fn to_response(row: ItemWithProgress) -> ChecklistItemWithProgress {
    let ItemWithProgress { item, progress } = row;
    ChecklistItemWithProgress {
        id: parse_uuid(&item.id, "checklist item id"),
        category_id: item.category_id.map(|c| parse_uuid(&c, "category id")),
        title: item.title,
        description: item.description,
        estimated_time: item.estimated_time,
        difficulty: item.difficulty,
        display_order: item.display_order,
        required: item.required,
        visa_specific: item.visa_specific,
        visa_types: item.visa_types,
        resources: item.resources,
        progress: ProgressInfo {
            status: progress.status,
            notes: progress.notes,
            completed_at: progress.completed_at,
        },
    }
}
