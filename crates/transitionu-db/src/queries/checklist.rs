use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use super::{OptionalExt, decode_resources, decode_string_list};
use crate::Database;
use crate::models::{
    ChecklistCategoryRow, ChecklistItemRow, ItemWithProgress, ProgressRow, ProgressState,
};
use transitionu_types::models::ChecklistStatus;

impl Database {
    pub fn get_checklist_categories(&self) -> Result<Vec<ChecklistCategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, display_order
                 FROM checklist_categories
                 ORDER BY display_order",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ChecklistCategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        display_order: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// All checklist items, optionally narrowed to a visa type: an item is
    /// in scope when it is not visa-specific or its visa_types contain the
    /// given type.
    pub fn get_all_items(&self, visa_type: Option<&str>) -> Result<Vec<ChecklistItemRow>> {
        let items = self.with_conn(|conn| query_items(conn, None))?;
        Ok(match visa_type {
            None => items,
            Some(vt) => items
                .into_iter()
                .filter(|item| !item.visa_specific || item.visa_types.iter().any(|t| t == vt))
                .collect(),
        })
    }

    pub fn get_user_progress(&self, user_id: &str) -> Result<Vec<ProgressRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, checklist_item_id, status, notes, completed_at
                 FROM user_checklist_progress
                 WHERE user_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .map(|(id, user_id, item_id, status, notes, completed_at)| ProgressRow {
                    status: parse_status(&status, &id),
                    id,
                    user_id,
                    checklist_item_id: item_id,
                    notes,
                    completed_at,
                })
                .collect())
        })
    }

    /// The checklist aggregator: every in-scope item, left-joined with the
    /// user's progress. Items without a progress row default to not_started.
    /// Either fetch failing fails the whole call — an error is distinct from
    /// an empty list.
    pub fn items_with_progress(
        &self,
        user_id: &str,
        visa_type: Option<&str>,
    ) -> Result<Vec<ItemWithProgress>> {
        let items = self.get_all_items(visa_type)?;
        let progress = self.get_user_progress(user_id)?;

        let mut by_item: HashMap<String, ProgressRow> = progress
            .into_iter()
            .map(|p| (p.checklist_item_id.clone(), p))
            .collect();

        Ok(items
            .into_iter()
            .map(|item| {
                let progress = by_item
                    .remove(&item.id)
                    .map(|p| ProgressState {
                        status: p.status,
                        notes: p.notes,
                        completed_at: p.completed_at,
                    })
                    .unwrap_or_default();
                ItemWithProgress { item, progress }
            })
            .collect())
    }

    /// Get-or-create the (user, item) progress row and set its status.
    /// completed_at is derived from status: set on completion (kept if
    /// already set, so repeating the update is a no-op) and cleared on any
    /// transition away from completed. Notes are only touched when given.
    pub fn update_progress(
        &self,
        user_id: &str,
        item_id: &str,
        status: ChecklistStatus,
        notes: Option<&str>,
    ) -> Result<ProgressRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let completed = status == ChecklistStatus::Completed;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM user_checklist_progress
                     WHERE user_id = ?1 AND checklist_item_id = ?2",
                    [user_id, item_id],
                    |row| row.get(0),
                )
                .optional()?;

            let row_id = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE user_checklist_progress SET
                             status = ?2,
                             notes = COALESCE(?3, notes),
                             completed_at = CASE WHEN ?4
                                 THEN COALESCE(completed_at, datetime('now'))
                                 ELSE NULL END,
                             updated_at = datetime('now')
                         WHERE id = ?1",
                        rusqlite::params![id, status.as_str(), notes, completed],
                    )?;
                    id
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    tx.execute(
                        "INSERT INTO user_checklist_progress
                             (id, user_id, checklist_item_id, status, notes, completed_at)
                         VALUES (?1, ?2, ?3, ?4, ?5,
                                 CASE WHEN ?6 THEN datetime('now') ELSE NULL END)",
                        rusqlite::params![id, user_id, item_id, status.as_str(), notes, completed],
                    )?;
                    id
                }
            };

            let row = tx.query_row(
                "SELECT id, user_id, checklist_item_id, status, notes, completed_at
                 FROM user_checklist_progress WHERE id = ?1",
                [&row_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                },
            )?;
            tx.commit()?;

            let (id, user_id, item_id, status, notes, completed_at) = row;
            Ok(ProgressRow {
                status: parse_status(&status, &id),
                id,
                user_id,
                checklist_item_id: item_id,
                notes,
                completed_at,
            })
        })
    }

    pub fn checklist_item_exists(&self, item_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row(
                    "SELECT id FROM checklist_items WHERE id = ?1",
                    [item_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn count_completed_items(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM user_checklist_progress
                 WHERE user_id = ?1 AND status = 'completed'",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn parse_status(raw: &str, row_id: &str) -> ChecklistStatus {
    ChecklistStatus::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt status '{}' on progress row '{}'", raw, row_id);
        ChecklistStatus::NotStarted
    })
}

fn query_items(conn: &Connection, category_id: Option<&str>) -> Result<Vec<ChecklistItemRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, category_id, title, description, estimated_time, difficulty,
                display_order, required, visa_specific, visa_types, resources
         FROM checklist_items
         WHERE ?1 IS NULL OR category_id = ?1
         ORDER BY display_order",
    )?;

    let rows = stmt
        .query_map([category_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, bool>(7)?,
                row.get::<_, bool>(8)?,
                row.get::<_, Option<String>>(9)?,
                row.get::<_, Option<String>>(10)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                category_id,
                title,
                description,
                estimated_time,
                difficulty,
                display_order,
                required,
                visa_specific,
                visa_types,
                resources,
            )| {
                ChecklistItemRow {
                    visa_types: decode_string_list(visa_types, "visa_types", &id),
                    resources: decode_resources(resources, &id),
                    id,
                    category_id,
                    title,
                    description,
                    estimated_time,
                    difficulty,
                    display_order,
                    required,
                    visa_specific,
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use transitionu_types::models::ChecklistStatus;

    #[test]
    fn items_with_progress_defaults_to_not_started() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "lin@example.edu");
        let cat = fixtures::checklist_category(&db, "Pre-arrival", 1);
        let a = fixtures::checklist_item(&db, &cat, "Apply for Student Visa", 1, false, &[]);
        let b = fixtures::checklist_item(&db, &cat, "Book Flights", 2, false, &[]);

        db.update_progress(&user, &a, ChecklistStatus::InProgress, None)
            .unwrap();

        let joined = db.items_with_progress(&user, None).unwrap();
        assert_eq!(joined.len(), 2);

        let first = joined.iter().find(|i| i.item.id == a).unwrap();
        assert_eq!(first.progress.status, ChecklistStatus::InProgress);

        let second = joined.iter().find(|i| i.item.id == b).unwrap();
        assert_eq!(second.progress.status, ChecklistStatus::NotStarted);
        assert!(second.progress.completed_at.is_none());
    }

    #[test]
    fn visa_filter_keeps_general_and_matching_items() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "omar@example.edu");
        let cat = fixtures::checklist_category(&db, "Visa", 1);
        let general = fixtures::checklist_item(&db, &cat, "Get Insurance", 1, false, &[]);
        let f1_only =
            fixtures::checklist_item(&db, &cat, "Pay SEVIS Fee", 2, true, &["F-1", "M-1"]);
        let j1_only = fixtures::checklist_item(&db, &cat, "DS-2019 Form", 3, true, &["J-1"]);

        let scoped = db.items_with_progress(&user, Some("F-1")).unwrap();
        let ids: Vec<&str> = scoped.iter().map(|i| i.item.id.as_str()).collect();
        assert!(ids.contains(&general.as_str()));
        assert!(ids.contains(&f1_only.as_str()));
        assert!(!ids.contains(&j1_only.as_str()));

        // no filter returns everything, visa-specific included
        assert_eq!(db.items_with_progress(&user, None).unwrap().len(), 3);
    }

    #[test]
    fn completed_at_tracks_status() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "sana@example.edu");
        let cat = fixtures::checklist_category(&db, "Arrival", 1);
        let item = fixtures::checklist_item(&db, &cat, "Open Bank Account", 1, false, &[]);

        let row = db
            .update_progress(&user, &item, ChecklistStatus::Completed, None)
            .unwrap();
        assert!(row.completed_at.is_some());

        // regression away from completed clears the timestamp
        let row = db
            .update_progress(&user, &item, ChecklistStatus::InProgress, None)
            .unwrap();
        assert_eq!(row.status, ChecklistStatus::InProgress);
        assert!(row.completed_at.is_none());

        let row = db
            .update_progress(&user, &item, ChecklistStatus::Skipped, None)
            .unwrap();
        assert!(row.completed_at.is_none());
    }

    #[test]
    fn completing_twice_is_idempotent() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "ade@example.edu");
        let cat = fixtures::checklist_category(&db, "Arrival", 1);
        let item = fixtures::checklist_item(&db, &cat, "Get SIM Card", 1, false, &[]);

        let first = db
            .update_progress(&user, &item, ChecklistStatus::Completed, None)
            .unwrap();
        let second = db
            .update_progress(&user, &item, ChecklistStatus::Completed, None)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.completed_at, second.completed_at);

        // still exactly one row for the (user, item) pair
        let progress = db.get_user_progress(&user).unwrap();
        assert_eq!(progress.len(), 1);
    }

    #[test]
    fn notes_are_kept_unless_replaced() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "nia@example.edu");
        let cat = fixtures::checklist_category(&db, "Arrival", 1);
        let item = fixtures::checklist_item(&db, &cat, "Register for Classes", 1, false, &[]);

        db.update_progress(&user, &item, ChecklistStatus::InProgress, Some("advisor meeting"))
            .unwrap();
        let row = db
            .update_progress(&user, &item, ChecklistStatus::Completed, None)
            .unwrap();
        assert_eq!(row.notes.as_deref(), Some("advisor meeting"));

        let row = db
            .update_progress(&user, &item, ChecklistStatus::Completed, Some("done early"))
            .unwrap();
        assert_eq!(row.notes.as_deref(), Some("done early"));
    }

    #[test]
    fn count_completed_items_counts_only_completed() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "leo@example.edu");
        let cat = fixtures::checklist_category(&db, "Arrival", 1);
        let a = fixtures::checklist_item(&db, &cat, "A", 1, false, &[]);
        let b = fixtures::checklist_item(&db, &cat, "B", 2, false, &[]);
        let c = fixtures::checklist_item(&db, &cat, "C", 3, false, &[]);

        db.update_progress(&user, &a, ChecklistStatus::Completed, None)
            .unwrap();
        db.update_progress(&user, &b, ChecklistStatus::Skipped, None)
            .unwrap();
        db.update_progress(&user, &c, ChecklistStatus::InProgress, None)
            .unwrap();

        assert_eq!(db.count_completed_items(&user).unwrap(), 1);
    }
}
