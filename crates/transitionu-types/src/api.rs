use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AchievementCategory, ChecklistStatus, ForumCategory, Resource, SortOrder, VoteType,
};
use crate::progress::{CategoryProgress, OverallProgress};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and token issuance.
/// Canonical definition lives here in transitionu-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: Option<String>,
    pub major: Option<String>,
    pub visa_type: Option<String>,
    pub home_country: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub institution: Option<String>,
    pub major: Option<String>,
    pub visa_type: Option<String>,
    pub home_country: Option<String>,
    pub avatar_url: Option<String>,
}

// -- Checklist --

#[derive(Debug, Serialize)]
pub struct ChecklistCategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i64,
}

/// A checklist item joined with the caller's progress. Progress defaults
/// to not_started when the user has no row for the item yet.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItemWithProgress {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub difficulty: Option<String>,
    pub display_order: i64,
    pub required: bool,
    pub visa_specific: bool,
    pub visa_types: Vec<String>,
    pub resources: Vec<Resource>,
    pub progress: ProgressInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressInfo {
    pub status: ChecklistStatus,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
}

impl Default for ProgressInfo {
    fn default() -> Self {
        Self {
            status: ChecklistStatus::NotStarted,
            notes: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProgressRequest {
    pub status: ChecklistStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChecklistSummaryResponse {
    pub categories: BTreeMap<String, CategoryProgress>,
    pub overall: OverallProgress,
}

// -- Forum --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category: ForumCategory,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub anonymous: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub reply_count: i64,
    pub user_vote: Option<VoteType>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub category: Option<ForumCategory>,
    pub author: Option<Uuid>,
    #[serde(default)]
    pub sort_by: PostSort,
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
    #[serde(default = "default_post_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    #[default]
    CreatedAt,
    Score,
}

fn default_sort_order() -> SortOrder {
    SortOrder::Desc
}

fn default_post_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_post_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

/// The active vote after a toggle. `None` means the vote was retracted;
/// callers re-fetch the post for fresh counts.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub vote: Option<VoteType>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReplyRequest {
    pub content: String,
    pub parent_reply_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub parent_reply_id: Option<Uuid>,
    pub content: String,
    pub anonymous: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: String,
}

// -- FAQ --

#[derive(Debug, Clone, Serialize)]
pub struct FaqItemResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub keywords: Vec<String>,
}

// -- Setup guides --

#[derive(Debug, Serialize)]
pub struct GuideCategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_name: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Serialize)]
pub struct GuideResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub institution_specific: bool,
    pub institutions: Vec<String>,
    pub major_specific: bool,
    pub majors: Vec<String>,
    pub display_order: i64,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
pub struct GuideQuery {
    pub institution: Option<String>,
    pub major: Option<String>,
}

// -- Achievements --

#[derive(Debug, Serialize)]
pub struct AchievementResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon_name: Option<String>,
    pub category: String,
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub struct EarnedAchievementResponse {
    pub achievement: AchievementResponse,
    pub earned_at: String,
}

#[derive(Debug, Deserialize)]
pub struct AchievementQuery {
    pub category: Option<AchievementCategory>,
}

// -- Messaging --

#[derive(Debug, Serialize)]
pub struct ParticipantInfo {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub participants: Vec<ParticipantInfo>,
    pub last_message: Option<DirectMessageResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenConversationRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectMessageResponse {
    pub id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagePageQuery {
    #[serde(default = "default_message_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_message_limit() -> u32 {
    50
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}
