use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::UserRow;
use transitionu_types::api::UpdateProfileRequest;

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, institution, major, \
                            visa_type, home_country, avatar_url, created_at, updated_at";

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, email, password_hash, first_name, last_name),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([email], read_user).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], read_user).optional()
        })
    }

    /// Patch-style profile update: absent fields keep their current value.
    pub fn update_profile(&self, id: &str, patch: &UpdateProfileRequest) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET
                     first_name   = COALESCE(?2, first_name),
                     last_name    = COALESCE(?3, last_name),
                     institution  = COALESCE(?4, institution),
                     major        = COALESCE(?5, major),
                     visa_type    = COALESCE(?6, visa_type),
                     home_country = COALESCE(?7, home_country),
                     avatar_url   = COALESCE(?8, avatar_url),
                     updated_at   = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    patch.first_name,
                    patch.last_name,
                    patch.institution,
                    patch.major,
                    patch.visa_type,
                    patch.home_country,
                    patch.avatar_url,
                ],
            )?;

            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([id], read_user).optional()
        })
    }
}

fn read_user(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        institution: row.get(5)?,
        major: row.get(6)?,
        visa_type: row.get(7)?,
        home_country: row.get(8)?,
        avatar_url: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use transitionu_types::api::UpdateProfileRequest;

    #[test]
    fn create_and_fetch_user() {
        let db = fixtures::db();
        let id = fixtures::user(&db, "mei@example.edu");

        let by_email = db.get_user_by_email("mei@example.edu").unwrap().unwrap();
        assert_eq!(by_email.id, id);

        let by_id = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(by_id.email, "mei@example.edu");

        assert!(db.get_user_by_email("nobody@example.edu").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = fixtures::db();
        fixtures::user(&db, "same@example.edu");
        let result = db.create_user("other-id", "same@example.edu", "hash", "A", "B");
        assert!(result.is_err());
    }

    #[test]
    fn profile_patch_leaves_absent_fields_alone() {
        let db = fixtures::db();
        let id = fixtures::user(&db, "amir@example.edu");

        let patch = UpdateProfileRequest {
            institution: Some("State University".into()),
            visa_type: Some("F-1".into()),
            ..Default::default()
        };
        let updated = db.update_profile(&id, &patch).unwrap().unwrap();
        assert_eq!(updated.institution.as_deref(), Some("State University"));
        assert_eq!(updated.visa_type.as_deref(), Some("F-1"));
        assert_eq!(updated.first_name, "Test");

        let patch2 = UpdateProfileRequest {
            major: Some("Economics".into()),
            ..Default::default()
        };
        let updated2 = db.update_profile(&id, &patch2).unwrap().unwrap();
        // earlier fields survive the second patch
        assert_eq!(updated2.institution.as_deref(), Some("State University"));
        assert_eq!(updated2.major.as_deref(), Some("Economics"));
    }
}
