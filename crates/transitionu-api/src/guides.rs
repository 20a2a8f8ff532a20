use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use transitionu_db::models::{GuideCategoryRow, GuideRow};
use transitionu_types::api::{Claims, GuideCategoryResponse, GuideQuery, GuideResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.db.get_guide_categories()?;
    let response: Vec<GuideCategoryResponse> =
        categories.into_iter().map(to_category_response).collect();
    Ok(Json(response))
}

pub async fn get_category_guides(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let guides = state.db.get_guides_by_category(&category_id.to_string())?;
    let response: Vec<GuideResponse> = guides.into_iter().map(to_guide_response).collect();
    Ok(Json(response))
}

pub async fn get_guide(
    State(state): State<AppState>,
    Path(guide_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let guide = state
        .db
        .get_guide_by_id(&guide_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_guide_response(guide)))
}

/// Guides matched against the caller's institution and major. Query
/// parameters override the profile, so a student can preview what another
/// institution's set looks like.
pub async fn personalized_guides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<GuideQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let guides = tokio::task::spawn_blocking(move || {
        let (institution, major) = match (query.institution, query.major) {
            (Some(i), Some(m)) => (Some(i), Some(m)),
            (institution, major) => {
                let profile = state.db.get_user_by_id(&claims.sub.to_string())?;
                let (profile_inst, profile_major) = profile
                    .map(|u| (u.institution, u.major))
                    .unwrap_or((None, None));
                (institution.or(profile_inst), major.or(profile_major))
            }
        };
        state
            .db
            .personalized_guides(institution.as_deref(), major.as_deref())
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let response: Vec<GuideResponse> = guides.into_iter().map(to_guide_response).collect();
    Ok(Json(response))
}

fn to_category_response(row: GuideCategoryRow) -> GuideCategoryResponse {
    GuideCategoryResponse {
        id: parse_uuid(&row.id, "guide category id"),
        name: row.name,
        description: row.description,
        icon_name: row.icon_name,
        display_order: row.display_order,
    }
}

fn to_guide_response(row: GuideRow) -> GuideResponse {
    GuideResponse {
        id: parse_uuid(&row.id, "guide id"),
        category_id: parse_uuid(&row.category_id, "guide category id"),
        title: row.title,
        content: row.content,
        institution_specific: row.institution_specific,
        institutions: row.institutions,
        major_specific: row.major_specific,
        majors: row.majors,
        display_order: row.display_order,
        resources: row.resources,
    }
}
