use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use crate::Database;
use crate::models::{AchievementRow, EarnedAchievementRow};
use transitionu_types::models::Requirement;

const ACHIEVEMENT_COLUMNS: &str =
    "id, title, description, icon_name, category, points, requirements";

impl Database {
    /// Achievements with a requirements blob that does not decode into a
    /// known variant are dropped with a warning — bad seed data must not
    /// take the listing down.
    pub fn get_achievements(&self, category: Option<&str>) -> Result<Vec<AchievementRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements
                 WHERE ?1 IS NULL OR category = ?1
                 ORDER BY points"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([category], read_achievement_raw)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().filter_map(into_achievement).collect())
        })
    }

    pub fn user_achievements(&self, user_id: &str) -> Result<Vec<EarnedAchievementRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.title, a.description, a.icon_name, a.category, a.points,
                        a.requirements, ua.earned_at
                 FROM user_achievements ua
                 JOIN achievements a ON ua.achievement_id = a.id
                 WHERE ua.user_id = ?1
                 ORDER BY ua.earned_at",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok((read_achievement_raw(row)?, row.get::<_, String>(7)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .filter_map(|(raw, earned_at)| {
                    into_achievement(raw).map(|achievement| EarnedAchievementRow {
                        achievement,
                        earned_at,
                    })
                })
                .collect())
        })
    }

    /// Get-or-create semantics: awarding an achievement the user already
    /// holds is a no-op. Returns whether the award was new.
    pub fn award_achievement(&self, user_id: &str, achievement_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO user_achievements (id, user_id, achievement_id)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![Uuid::new_v4().to_string(), user_id, achievement_id],
            )?;
            Ok(changed > 0)
        })
    }
}

type AchievementRaw = (
    String,
    String,
    String,
    Option<String>,
    String,
    i64,
    String,
);

fn read_achievement_raw(
    row: &rusqlite::Row<'_>,
) -> std::result::Result<AchievementRaw, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_achievement(raw: AchievementRaw) -> Option<AchievementRow> {
    let (id, title, description, icon_name, category, points, requirements) = raw;
    let requirements: Requirement = match serde_json::from_str(&requirements) {
        Ok(req) => req,
        Err(e) => {
            warn!("Corrupt requirements on achievement '{}': {}", id, e);
            return None;
        }
    };
    Some(AchievementRow {
        id,
        title,
        description,
        icon_name,
        category,
        points,
        requirements,
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use transitionu_types::models::Requirement;
    use uuid::Uuid;

    fn achievement(db: &crate::Database, title: &str, category: &str, requirements: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO achievements (id, title, description, category, points, requirements)
                 VALUES (?1, ?2, 'desc', ?3, 10, ?4)",
                rusqlite::params![id, title, category, requirements],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    #[test]
    fn awarding_twice_is_get_or_create() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "winner@example.edu");
        let ach = achievement(
            &db,
            "First Steps",
            "pre-arrival",
            r#"{"type":"checklist_items_completed","count":1}"#,
        );

        assert!(db.award_achievement(&user, &ach).unwrap());
        assert!(!db.award_achievement(&user, &ach).unwrap());

        let earned = db.user_achievements(&user).unwrap();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].achievement.title, "First Steps");
        assert_eq!(
            earned[0].achievement.requirements,
            Requirement::ChecklistItemsCompleted { count: 1 }
        );
    }

    #[test]
    fn corrupt_requirements_are_skipped_not_fatal() {
        let db = fixtures::db();
        achievement(&db, "Good", "community", r#"{"type":"forum_posts_created","count":1}"#);
        achievement(&db, "Bad", "community", r#"{"kind":"mystery"}"#);

        let all = db.get_achievements(Some("community")).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Good");
    }
}
