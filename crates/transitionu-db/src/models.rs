//! Database row types — these map directly to SQLite rows. Distinct from
//! the transitionu-types API models to keep the DB layer independent.
//! JSON columns (visa_types, keywords, resources, requirements, ...) are
//! decoded at this boundary rather than passed through as untyped text.

use transitionu_types::models::{ChecklistStatus, Requirement, Resource};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: Option<String>,
    pub major: Option<String>,
    pub visa_type: Option<String>,
    pub home_country: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ChecklistCategoryRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i64,
}

pub struct ChecklistItemRow {
    pub id: String,
    pub category_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub difficulty: Option<String>,
    pub display_order: i64,
    pub required: bool,
    pub visa_specific: bool,
    pub visa_types: Vec<String>,
    pub resources: Vec<Resource>,
}

pub struct ProgressRow {
    pub id: String,
    pub user_id: String,
    pub checklist_item_id: String,
    pub status: ChecklistStatus,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
}

/// Current progress on one item, defaulted when the user has no row yet.
#[derive(Clone)]
pub struct ProgressState {
    pub status: ChecklistStatus,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            status: ChecklistStatus::NotStarted,
            notes: None,
            completed_at: None,
        }
    }
}

/// A checklist item left-joined with the requesting user's progress.
pub struct ItemWithProgress {
    pub item: ChecklistItemRow,
    pub progress: ProgressState,
}

pub struct AchievementRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon_name: Option<String>,
    pub category: String,
    pub points: i64,
    pub requirements: Requirement,
}

pub struct EarnedAchievementRow {
    pub achievement: AchievementRow,
    pub earned_at: String,
}

pub struct GuideCategoryRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_name: Option<String>,
    pub display_order: i64,
}

pub struct GuideRow {
    pub id: String,
    pub category_id: String,
    pub title: String,
    pub content: String,
    pub institution_specific: bool,
    pub institutions: Vec<String>,
    pub major_specific: bool,
    pub majors: Vec<String>,
    pub display_order: i64,
    pub resources: Vec<Resource>,
}

pub struct FaqRow {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub keywords: Vec<String>,
}

/// A forum post with its vote and reply counts aggregated from the vote
/// and reply tables — the tables are the source of truth, the post row
/// carries no denormalized counters.
pub struct PostStatsRow {
    pub id: String,
    pub user_id: Option<String>,
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub anonymous: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub reply_count: i64,
    pub user_vote: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ReplyRow {
    pub id: String,
    pub post_id: String,
    pub user_id: Option<String>,
    pub author_name: Option<String>,
    pub parent_reply_id: Option<String>,
    pub content: String,
    pub anonymous: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ParticipantRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

pub struct DirectMessageRow {
    pub id: String,
    pub conversation_id: Option<String>,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: String,
}
