pub mod achievements;
pub mod checklist;
pub mod faq;
pub mod forum;
pub mod guides;
pub mod messaging;
pub mod users;

use anyhow::Result;
use tracing::warn;

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Decode a JSON string-array column. NULL means empty; corrupt JSON is
/// logged and treated as empty rather than failing the whole query.
pub(crate) fn decode_string_list(raw: Option<String>, column: &str, row_id: &str) -> Vec<String> {
    match raw {
        None => vec![],
        Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Corrupt {} on row '{}': {}", column, row_id, e);
            vec![]
        }),
    }
}

/// Decode a JSON resources column into the tagged Resource variant.
pub(crate) fn decode_resources(
    raw: Option<String>,
    row_id: &str,
) -> Vec<transitionu_types::models::Resource> {
    match raw {
        None => vec![],
        Some(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Corrupt resources on row '{}': {}", row_id, e);
            vec![]
        }),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Database;
    use uuid::Uuid;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, email, "hash", "Test", "User").unwrap();
        id
    }

    pub fn checklist_category(db: &Database, name: &str, order: i64) -> String {
        let id = Uuid::new_v4().to_string();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checklist_categories (id, name, display_order) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, name, order],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    pub fn checklist_item(
        db: &Database,
        category_id: &str,
        title: &str,
        order: i64,
        visa_specific: bool,
        visa_types: &[&str],
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let types_json = serde_json::to_string(visa_types).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checklist_items
                     (id, category_id, title, display_order, required, visa_specific, visa_types)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
                rusqlite::params![id, category_id, title, order, visa_specific, types_json],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    pub fn post(db: &Database, user_id: &str, title: &str, category: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_post(&id, Some(user_id), title, "content", category, false)
            .unwrap();
        id
    }
}
