use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use transitionu_db::models::FaqRow;
use transitionu_types::api::FaqItemResponse;
use transitionu_types::faq;
use transitionu_types::models::FaqCategory;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

#[derive(Debug, Deserialize)]
pub struct FaqListQuery {
    pub category: Option<FaqCategory>,
    pub q: Option<String>,
}

/// FAQ listing with optional category scoping and keyword search. The
/// whole set is small enough that search runs in-process over the rows.
pub async fn list_faqs(
    State(state): State<AppState>,
    Query(query): Query<FaqListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = match query.category {
        Some(category) => state.db.get_faqs_by_category(category.as_str())?,
        None => state.db.get_all_faqs()?,
    };

    let faqs: Vec<FaqItemResponse> = rows.into_iter().map(to_response).collect();
    let faqs = match query.q.as_deref() {
        Some(q) => faq::search(&faqs, q),
        None => faqs,
    };
    Ok(Json(faqs))
}

pub async fn get_faq(
    State(state): State<AppState>,
    Path(faq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_faq_by_id(&faq_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_response(row)))
}

fn to_response(row: FaqRow) -> FaqItemResponse {
    FaqItemResponse {
        id: parse_uuid(&row.id, "faq id"),
        question: row.question,
        answer: row.answer,
        category: row.category,
        keywords: row.keywords,
    }
}
