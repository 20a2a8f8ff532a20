use anyhow::Result;
use rusqlite::Connection;

use super::{OptionalExt, decode_string_list};
use crate::Database;
use crate::models::FaqRow;

impl Database {
    /// All FAQ entries, ordered by category so grouped views come back in
    /// a stable order. Keyword search happens in-process over this set.
    pub fn get_all_faqs(&self) -> Result<Vec<FaqRow>> {
        self.with_conn(|conn| query_faqs(conn, None))
    }

    pub fn get_faqs_by_category(&self, category: &str) -> Result<Vec<FaqRow>> {
        self.with_conn(|conn| query_faqs(conn, Some(category)))
    }

    pub fn get_faq_by_id(&self, id: &str) -> Result<Option<FaqRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, question, answer, category, keywords FROM faq_items WHERE id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                })
                .optional()?;
            Ok(row.map(into_faq_row))
        })
    }
}

fn query_faqs(conn: &Connection, category: Option<&str>) -> Result<Vec<FaqRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, question, answer, category, keywords
         FROM faq_items
         WHERE ?1 IS NULL OR category = ?1
         ORDER BY category",
    )?;
    let rows = stmt
        .query_map([category], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(into_faq_row).collect())
}

fn into_faq_row(
    (id, question, answer, category, keywords): (String, String, String, String, Option<String>),
) -> FaqRow {
    FaqRow {
        keywords: decode_string_list(keywords, "keywords", &id),
        id,
        question,
        answer,
        category,
    }
}
