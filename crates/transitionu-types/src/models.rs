use serde::{Deserialize, Serialize};

/// A user's status against one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

impl ChecklistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Visa types for international students, used as a filter dimension
/// for which checklist items apply to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisaType {
    #[serde(rename = "F-1")]
    F1,
    #[serde(rename = "J-1")]
    J1,
    #[serde(rename = "M-1")]
    M1,
}

impl VisaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F1 => "F-1",
            Self::J1 => "J-1",
            Self::M1 => "M-1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upvote" => Some(Self::Upvote),
            "downvote" => Some(Self::Downvote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumCategory {
    Visa,
    Housing,
    Academics,
    Social,
    Finance,
    Health,
    Cultural,
    Work,
    General,
}

impl ForumCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Housing => "housing",
            Self::Academics => "academics",
            Self::Social => "social",
            Self::Finance => "finance",
            Self::Health => "health",
            Self::Cultural => "cultural",
            Self::Work => "work",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqCategory {
    Visa,
    Housing,
    Academics,
    Finance,
    Health,
    Cultural,
    Work,
    General,
}

impl FaqCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Housing => "housing",
            Self::Academics => "academics",
            Self::Finance => "finance",
            Self::Health => "health",
            Self::Cultural => "cultural",
            Self::Work => "work",
            Self::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementCategory {
    #[serde(rename = "pre-arrival")]
    PreArrival,
    #[serde(rename = "post-arrival")]
    PostArrival,
    #[serde(rename = "community")]
    Community,
    #[serde(rename = "academic")]
    Academic,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreArrival => "pre-arrival",
            Self::PostArrival => "post-arrival",
            Self::Community => "community",
            Self::Academic => "academic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A link or document attached to a checklist item or setup guide.
/// Stored as a tagged JSON value and decoded at the store boundary, so
/// an unknown shape fails loudly instead of flowing through untyped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resource {
    Link { title: String, url: String },
    Document { title: String, url: String },
    Phone { title: String, number: String },
}

/// What a user must have done to earn an achievement. Tagged variant per
/// known achievement kind rather than an untyped requirements blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    ChecklistItemsCompleted { count: u32 },
    ForumPostsCreated { count: u32 },
    RepliesPosted { count: u32 },
    ProfileCompleted,
}

/// Counters an achievement requirement is evaluated against.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressContext {
    pub checklist_items_completed: u32,
    pub forum_posts_created: u32,
    pub replies_posted: u32,
    pub profile_completed: bool,
}

impl Requirement {
    pub fn is_met(&self, ctx: &ProgressContext) -> bool {
        match self {
            Self::ChecklistItemsCompleted { count } => ctx.checklist_items_completed >= *count,
            Self::ForumPostsCreated { count } => ctx.forum_posts_created >= *count,
            Self::RepliesPosted { count } => ctx.replies_posted >= *count,
            Self::ProfileCompleted => ctx.profile_completed,
        }
    }
}
