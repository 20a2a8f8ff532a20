use axum::{Extension, Json, extract::State, response::IntoResponse};

use transitionu_db::models::UserRow;
use transitionu_types::api::{Claims, UpdateProfileRequest, UserResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_response(user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if patch.first_name.as_deref().is_some_and(|n| n.trim().is_empty())
        || patch.last_name.as_deref().is_some_and(|n| n.trim().is_empty())
    {
        return Err(ApiError::Validation("name cannot be empty"));
    }

    let user = state
        .db
        .update_profile(&claims.sub.to_string(), &patch)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_response(user)))
}

pub(crate) fn to_response(user: UserRow) -> UserResponse {
    UserResponse {
        id: parse_uuid(&user.id, "user id"),
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        institution: user.institution,
        major: user.major,
        visa_type: user.visa_type,
        home_country: user.home_country,
        avatar_url: user.avatar_url,
        created_at: user.created_at,
    }
}
