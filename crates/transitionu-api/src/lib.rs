pub mod achievements;
pub mod auth;
pub mod checklist;
pub mod error;
pub mod faq;
pub mod forum;
pub mod guides;
pub mod messaging;
pub mod middleware;
pub mod users;

use tracing::warn;
use uuid::Uuid;

/// Row ids are TEXT in SQLite; a row that fails to parse is corrupt data,
/// logged and mapped to the nil UUID rather than failing the response.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}
