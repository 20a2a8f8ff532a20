use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use transitionu_db::models::{ConversationRow, DirectMessageRow, ParticipantRow};
use transitionu_types::api::{
    Claims, ConversationResponse, DirectMessageResponse, MessagePageQuery,
    OpenConversationRequest, ParticipantInfo, SendMessageRequest, UnreadCountResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

const MAX_MESSAGE_PAGE: u32 = 200;

/// The caller's conversations, newest activity first, each carrying its
/// participants and latest message for inbox rendering.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let response = tokio::task::spawn_blocking(move || {
        let conversations = state.db.user_conversations(&claims.sub.to_string())?;
        conversations
            .into_iter()
            .map(|convo| {
                let participants = state.db.conversation_participants(&convo.id)?;
                let last_message = state.db.latest_message(&convo.id)?;
                Ok(to_conversation_response(convo, participants, last_message))
            })
            .collect::<anyhow::Result<Vec<ConversationResponse>>>()
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(response))
}

/// Find or create the 1:1 conversation with another user. Opening the
/// same pair twice always lands on the same conversation.
pub async fn open_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OpenConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.user_id == claims.sub {
        return Err(ApiError::Validation("cannot message yourself"));
    }
    if state.db.get_user_by_id(&req.user_id.to_string())?.is_none() {
        return Err(ApiError::NotFound);
    }

    let convo = state
        .db
        .find_or_create_conversation(&claims.sub.to_string(), &req.user_id.to_string())?;
    let participants = state.db.conversation_participants(&convo.id)?;
    let last_message = state.db.latest_message(&convo.id)?;

    Ok(Json(to_conversation_response(
        convo,
        participants,
        last_message,
    )))
}

pub async fn conversation_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Query(page): Query<MessagePageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = conversation_id.to_string();
    if !state
        .db
        .is_participant(&conversation_id, &claims.sub.to_string())?
    {
        return Err(ApiError::Forbidden);
    }

    let messages = state.db.conversation_messages(
        &conversation_id,
        page.limit.min(MAX_MESSAGE_PAGE),
        page.offset,
    )?;
    let response: Vec<DirectMessageResponse> =
        messages.into_iter().map(to_message_response).collect();
    Ok(Json(response))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("message content is required"));
    }
    if req.recipient_id == claims.sub {
        return Err(ApiError::Validation("cannot message yourself"));
    }
    if state
        .db
        .get_user_by_id(&req.recipient_id.to_string())?
        .is_none()
    {
        return Err(ApiError::NotFound);
    }

    let convo = state
        .db
        .find_or_create_conversation(&claims.sub.to_string(), &req.recipient_id.to_string())?;
    let message = state.db.send_message(
        &Uuid::new_v4().to_string(),
        &convo.id,
        &claims.sub.to_string(),
        &req.recipient_id.to_string(),
        &req.content,
    )?;

    Ok((StatusCode::CREATED, Json(to_message_response(message))))
}

/// Only the recipient can mark a message read.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .db
        .get_message(&message_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if message.recipient_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .db
        .mark_message_read(&message_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_message_response(updated)))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let count = state.db.unread_count(&claims.sub.to_string())?;
    Ok(Json(UnreadCountResponse { count }))
}

fn to_conversation_response(
    convo: ConversationRow,
    participants: Vec<ParticipantRow>,
    last_message: Option<DirectMessageRow>,
) -> ConversationResponse {
    ConversationResponse {
        id: parse_uuid(&convo.id, "conversation id"),
        participants: participants
            .into_iter()
            .map(|p| ParticipantInfo {
                user_id: parse_uuid(&p.user_id, "participant id"),
                first_name: p.first_name,
                last_name: p.last_name,
                avatar_url: p.avatar_url,
            })
            .collect(),
        last_message: last_message.map(to_message_response),
        created_at: convo.created_at,
        updated_at: convo.updated_at,
    }
}

fn to_message_response(message: DirectMessageRow) -> DirectMessageResponse {
    DirectMessageResponse {
        id: parse_uuid(&message.id, "message id"),
        conversation_id: message
            .conversation_id
            .map(|c| parse_uuid(&c, "conversation id")),
        sender_id: parse_uuid(&message.sender_id, "sender id"),
        recipient_id: parse_uuid(&message.recipient_id, "recipient id"),
        content: message.content,
        read: message.read,
        created_at: message.created_at,
    }
}
