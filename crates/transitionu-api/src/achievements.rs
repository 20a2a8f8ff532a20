use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::info;

use transitionu_db::Database;
use transitionu_db::models::AchievementRow;
use transitionu_types::api::{
    AchievementQuery, AchievementResponse, Claims, EarnedAchievementResponse,
};
use transitionu_types::models::ProgressContext;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::parse_uuid;

pub async fn list_achievements(
    State(state): State<AppState>,
    Query(query): Query<AchievementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let achievements = state
        .db
        .get_achievements(query.category.map(|c| c.as_str()))?;
    let response: Vec<AchievementResponse> =
        achievements.into_iter().map(to_response).collect();
    Ok(Json(response))
}

pub async fn earned_achievements(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let earned = state.db.user_achievements(&claims.sub.to_string())?;
    let response: Vec<EarnedAchievementResponse> = earned
        .into_iter()
        .map(|e| EarnedAchievementResponse {
            achievement: to_response(e.achievement),
            earned_at: e.earned_at,
        })
        .collect();
    Ok(Json(response))
}

/// Evaluate every achievement's requirement against the user's current
/// counters and award the ones newly met. Returns the titles of new
/// awards. Called after the actions that can move the counters.
pub(crate) fn check_and_award(db: &Database, user_id: &str) -> anyhow::Result<Vec<String>> {
    let ctx = build_context(db, user_id)?;

    let mut newly_earned = Vec::new();
    for achievement in db.get_achievements(None)? {
        if !achievement.requirements.is_met(&ctx) {
            continue;
        }
        if db.award_achievement(user_id, &achievement.id)? {
            info!("User {} earned '{}'", user_id, achievement.title);
            newly_earned.push(achievement.title);
        }
    }
    Ok(newly_earned)
}

fn build_context(db: &Database, user_id: &str) -> anyhow::Result<ProgressContext> {
    let profile_completed = db.get_user_by_id(user_id)?.is_some_and(|u| {
        u.institution.is_some()
            && u.major.is_some()
            && u.visa_type.is_some()
            && u.home_country.is_some()
    });

    Ok(ProgressContext {
        checklist_items_completed: db.count_completed_items(user_id)? as u32,
        forum_posts_created: db.count_user_posts(user_id)? as u32,
        replies_posted: db.count_user_replies(user_id)? as u32,
        profile_completed,
    })
}

fn to_response(achievement: AchievementRow) -> AchievementResponse {
    AchievementResponse {
        id: parse_uuid(&achievement.id, "achievement id"),
        title: achievement.title,
        description: achievement.description,
        icon_name: achievement.icon_name,
        category: achievement.category,
        points: achievement.points,
    }
}

#[cfg(test)]
mod tests {
    use super::check_and_award;
    use transitionu_db::Database;
    use transitionu_types::models::ChecklistStatus;
    use uuid::Uuid;

    fn db_with_achievement(title: &str, requirements: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO achievements (id, title, description, category, points, requirements)
                 VALUES (?1, ?2, 'desc', 'pre-arrival', 10, ?3)",
                rusqlite::params![Uuid::new_v4().to_string(), title, requirements],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn user(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, "student@example.edu", "hash", "Test", "Student")
            .unwrap();
        id
    }

    fn checklist_item(db: &Database) -> String {
        let id = Uuid::new_v4().to_string();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checklist_items (id, title, display_order, required, visa_specific)
                 VALUES (?1, 'Pay SEVIS Fee', 1, 1, 0)",
                [&id],
            )?;
            Ok(())
        })
        .unwrap();
        id
    }

    #[test]
    fn awards_when_threshold_is_crossed_and_only_once() {
        let db = db_with_achievement(
            "First Steps",
            r#"{"type":"checklist_items_completed","count":1}"#,
        );
        let user = user(&db);

        // nothing completed yet: nothing to award
        assert!(check_and_award(&db, &user).unwrap().is_empty());

        let item = checklist_item(&db);
        db.update_progress(&user, &item, ChecklistStatus::Completed, None)
            .unwrap();

        let newly = check_and_award(&db, &user).unwrap();
        assert_eq!(newly, vec!["First Steps".to_string()]);

        // already earned: a second pass awards nothing
        assert!(check_and_award(&db, &user).unwrap().is_empty());
        assert_eq!(db.user_achievements(&user).unwrap().len(), 1);
    }

    #[test]
    fn profile_requirement_needs_every_field() {
        let db = db_with_achievement("All Set Up", r#"{"type":"profile_completed"}"#);
        let user = user(&db);

        assert!(check_and_award(&db, &user).unwrap().is_empty());

        let patch = transitionu_types::api::UpdateProfileRequest {
            institution: Some("State University".into()),
            major: Some("Computer Science".into()),
            visa_type: Some("F-1".into()),
            home_country: Some("Brazil".into()),
            ..Default::default()
        };
        db.update_profile(&user, &patch).unwrap();

        let newly = check_and_award(&db, &user).unwrap();
        assert_eq!(newly, vec!["All Set Up".to_string()]);
    }
}
