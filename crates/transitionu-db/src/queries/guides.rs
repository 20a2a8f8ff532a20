use anyhow::Result;
use rusqlite::Connection;

use super::{OptionalExt, decode_resources, decode_string_list};
use crate::Database;
use crate::models::{GuideCategoryRow, GuideRow};

impl Database {
    pub fn get_guide_categories(&self) -> Result<Vec<GuideCategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, icon_name, display_order
                 FROM setup_guide_categories
                 ORDER BY display_order",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(GuideCategoryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        icon_name: row.get(3)?,
                        display_order: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_guides_by_category(&self, category_id: &str) -> Result<Vec<GuideRow>> {
        self.with_conn(|conn| query_guides(conn, Some(category_id)))
    }

    pub fn get_guide_by_id(&self, id: &str) -> Result<Option<GuideRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{GUIDE_SELECT} WHERE id = ?1"))?;
            let row = stmt.query_row([id], read_guide_raw).optional()?;
            Ok(row.map(into_guide_row))
        })
    }

    /// Guides scoped to a student's institution and major. A guide marked
    /// institution-specific only shows when the student's institution is in
    /// its list; with no institution given, specific guides drop out
    /// entirely. Majors work the same way.
    pub fn personalized_guides(
        &self,
        institution: Option<&str>,
        major: Option<&str>,
    ) -> Result<Vec<GuideRow>> {
        let guides = self.with_conn(|conn| query_guides(conn, None))?;

        Ok(guides
            .into_iter()
            .filter(|g| match institution {
                Some(inst) => {
                    !g.institution_specific || g.institutions.iter().any(|i| i == inst)
                }
                None => !g.institution_specific,
            })
            .filter(|g| match major {
                Some(m) => !g.major_specific || g.majors.iter().any(|x| x == m),
                None => !g.major_specific,
            })
            .collect())
    }
}

const GUIDE_SELECT: &str = "SELECT id, category_id, title, content, institution_specific, \
                            institutions, major_specific, majors, display_order, resources \
                            FROM setup_guides";

type GuideRaw = (
    String,
    String,
    String,
    String,
    bool,
    Option<String>,
    bool,
    Option<String>,
    i64,
    Option<String>,
);

fn read_guide_raw(row: &rusqlite::Row<'_>) -> std::result::Result<GuideRaw, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn into_guide_row(raw: GuideRaw) -> GuideRow {
    let (
        id,
        category_id,
        title,
        content,
        institution_specific,
        institutions,
        major_specific,
        majors,
        display_order,
        resources,
    ) = raw;
    GuideRow {
        institutions: decode_string_list(institutions, "institutions", &id),
        majors: decode_string_list(majors, "majors", &id),
        resources: decode_resources(resources, &id),
        id,
        category_id,
        title,
        content,
        institution_specific,
        major_specific,
        display_order,
    }
}

fn query_guides(conn: &Connection, category_id: Option<&str>) -> Result<Vec<GuideRow>> {
    let sql = format!(
        "{GUIDE_SELECT} WHERE ?1 IS NULL OR category_id = ?1 ORDER BY display_order"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([category_id], read_guide_raw)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(into_guide_row).collect())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use uuid::Uuid;

    fn guide_category(db: &crate::Database, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO setup_guide_categories (id, name, display_order) VALUES (?1, ?2, 1)",
                rusqlite::params![id, name],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn guide(
        db: &crate::Database,
        category: &str,
        title: &str,
        inst_specific: bool,
        institutions: &[&str],
        major_specific: bool,
        majors: &[&str],
    ) -> String {
        let id = Uuid::new_v4().to_string();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO setup_guides
                     (id, category_id, title, content, institution_specific, institutions,
                      major_specific, majors, display_order)
                 VALUES (?1, ?2, ?3, 'content', ?4, ?5, ?6, ?7, 1)",
                rusqlite::params![
                    id,
                    category,
                    title,
                    inst_specific,
                    serde_json::to_string(institutions).unwrap(),
                    major_specific,
                    serde_json::to_string(majors).unwrap(),
                ],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    #[test]
    fn personalization_filters_by_institution_and_major() {
        let db = fixtures::db();
        let cat = guide_category(&db, "Banking");
        let general = guide(&db, &cat, "Open an account", false, &[], false, &[]);
        let su_only = guide(
            &db,
            &cat,
            "State University credit union",
            true,
            &["State University"],
            false,
            &[],
        );
        let cs_only = guide(&db, &cat, "CS lab access", false, &[], true, &["Computer Science"]);

        let hits = db
            .personalized_guides(Some("State University"), Some("Computer Science"))
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&su_only.as_str()));
        assert!(ids.contains(&cs_only.as_str()));

        // a different institution loses the specific guide
        let hits = db
            .personalized_guides(Some("Other College"), Some("Computer Science"))
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|g| g.id.as_str()).collect();
        assert!(!ids.contains(&su_only.as_str()));

        // no profile data at all: only fully general guides remain
        let hits = db.personalized_guides(None, None).unwrap();
        let ids: Vec<&str> = hits.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec![general.as_str()]);
    }

    #[test]
    fn guides_by_category_keeps_display_order() {
        let db = fixtures::db();
        let cat = guide_category(&db, "Phone");
        let b = guide(&db, &cat, "B", false, &[], false, &[]);
        let a = guide(&db, &cat, "A", false, &[], false, &[]);
        // same display_order; insertion order is not what matters here,
        // just that both come back for the category
        let got = db.get_guides_by_category(&cat).unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.iter().any(|g| g.id == a));
        assert!(got.iter().any(|g| g.id == b));
    }
}
