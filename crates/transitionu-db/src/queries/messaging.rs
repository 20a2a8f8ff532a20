use anyhow::Result;
use uuid::Uuid;

use super::OptionalExt;
use crate::Database;
use crate::models::{ConversationRow, DirectMessageRow, ParticipantRow};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, recipient_id, content, read, created_at";

impl Database {
    pub fn user_conversations(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.created_at, c.updated_at
                 FROM conversations c
                 JOIN conversation_participants p ON p.conversation_id = c.id
                 WHERE p.user_id = ?1
                 ORDER BY c.updated_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ConversationRow {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn conversation_participants(&self, conversation_id: &str) -> Result<Vec<ParticipantRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.first_name, u.last_name, u.avatar_url
                 FROM conversation_participants p
                 JOIN users u ON p.user_id = u.id
                 WHERE p.conversation_id = ?1",
            )?;
            let rows = stmt
                .query_map([conversation_id], |row| {
                    Ok(ParticipantRow {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_participant(&self, conversation_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<String> = conn
                .query_row(
                    "SELECT id FROM conversation_participants
                     WHERE conversation_id = ?1 AND user_id = ?2",
                    [conversation_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// The 1:1 conversation between two users, creating it (with both
    /// participant rows) if none exists yet.
    pub fn find_or_create_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<ConversationRow> {
        self.with_conn_mut(|conn| {
            let shared: Option<String> = conn
                .query_row(
                    "SELECT conversation_id FROM conversation_participants WHERE user_id = ?1
                     INTERSECT
                     SELECT conversation_id FROM conversation_participants WHERE user_id = ?2
                     LIMIT 1",
                    [user_a, user_b],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = shared {
                return conn
                    .query_row(
                        "SELECT id, created_at, updated_at FROM conversations WHERE id = ?1",
                        [&id],
                        |row| {
                            Ok(ConversationRow {
                                id: row.get(0)?,
                                created_at: row.get(1)?,
                                updated_at: row.get(2)?,
                            })
                        },
                    )
                    .map_err(Into::into);
            }

            let tx = conn.transaction()?;
            let conversation_id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO conversations (id) VALUES (?1)",
                [&conversation_id],
            )?;
            for user in [user_a, user_b] {
                tx.execute(
                    "INSERT INTO conversation_participants (id, conversation_id, user_id)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![Uuid::new_v4().to_string(), conversation_id, user],
                )?;
            }
            let row = tx.query_row(
                "SELECT id, created_at, updated_at FROM conversations WHERE id = ?1",
                [&conversation_id],
                |row| {
                    Ok(ConversationRow {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn conversation_messages(
        &self,
        conversation_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DirectMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM direct_messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![conversation_id, limit, offset],
                    read_message,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn latest_message(&self, conversation_id: &str) -> Result<Option<DirectMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM direct_messages
                 WHERE conversation_id = ?1
                 ORDER BY created_at DESC
                 LIMIT 1"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([conversation_id], read_message).optional()
        })
    }

    /// Insert a message and bump the conversation's updated_at in one
    /// transaction, so conversation ordering follows the latest message.
    pub fn send_message(
        &self,
        id: &str,
        conversation_id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<DirectMessageRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO direct_messages (id, conversation_id, sender_id, recipient_id, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, conversation_id, sender_id, recipient_id, content],
            )?;
            tx.execute(
                "UPDATE conversations SET updated_at = datetime('now') WHERE id = ?1",
                [conversation_id],
            )?;
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM direct_messages WHERE id = ?1");
            let row = tx.query_row(&sql, [id], read_message)?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_message(&self, message_id: &str) -> Result<Option<DirectMessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM direct_messages WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([message_id], read_message).optional()
        })
    }

    pub fn mark_message_read(&self, message_id: &str) -> Result<Option<DirectMessageRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE direct_messages SET read = 1 WHERE id = ?1",
                [message_id],
            )?;
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM direct_messages WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row([message_id], read_message).optional()
        })
    }

    pub fn unread_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM direct_messages WHERE recipient_id = ?1 AND read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn read_message(row: &rusqlite::Row<'_>) -> std::result::Result<DirectMessageRow, rusqlite::Error> {
    Ok(DirectMessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        recipient_id: row.get(3)?,
        content: row.get(4)?,
        read: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use uuid::Uuid;

    #[test]
    fn find_or_create_is_stable_per_pair() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a@example.edu");
        let b = fixtures::user(&db, "b@example.edu");
        let c = fixtures::user(&db, "c@example.edu");

        let first = db.find_or_create_conversation(&a, &b).unwrap();
        let again = db.find_or_create_conversation(&b, &a).unwrap();
        assert_eq!(first.id, again.id);

        let other = db.find_or_create_conversation(&a, &c).unwrap();
        assert_ne!(first.id, other.id);

        let participants = db.conversation_participants(&first.id).unwrap();
        assert_eq!(participants.len(), 2);
    }

    #[test]
    fn send_and_page_messages() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a@example.edu");
        let b = fixtures::user(&db, "b@example.edu");
        let convo = db.find_or_create_conversation(&a, &b).unwrap();

        for i in 0..3 {
            let id = Uuid::new_v4().to_string();
            db.send_message(&id, &convo.id, &a, &b, &format!("hello {i}"))
                .unwrap();
        }

        let page = db.conversation_messages(&convo.id, 2, 0).unwrap();
        assert_eq!(page.len(), 2);
        let rest = db.conversation_messages(&convo.id, 2, 2).unwrap();
        assert_eq!(rest.len(), 1);

        let latest = db.latest_message(&convo.id).unwrap().unwrap();
        assert!(!latest.read);
    }

    #[test]
    fn unread_count_tracks_read_flags() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a@example.edu");
        let b = fixtures::user(&db, "b@example.edu");
        let convo = db.find_or_create_conversation(&a, &b).unwrap();

        let m1 = Uuid::new_v4().to_string();
        let m2 = Uuid::new_v4().to_string();
        db.send_message(&m1, &convo.id, &a, &b, "one").unwrap();
        db.send_message(&m2, &convo.id, &a, &b, "two").unwrap();

        assert_eq!(db.unread_count(&b).unwrap(), 2);
        assert_eq!(db.unread_count(&a).unwrap(), 0);

        let read = db.mark_message_read(&m1).unwrap().unwrap();
        assert!(read.read);
        assert_eq!(db.unread_count(&b).unwrap(), 1);
    }

    #[test]
    fn is_participant_gates_access() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a@example.edu");
        let b = fixtures::user(&db, "b@example.edu");
        let stranger = fixtures::user(&db, "x@example.edu");
        let convo = db.find_or_create_conversation(&a, &b).unwrap();

        assert!(db.is_participant(&convo.id, &a).unwrap());
        assert!(!db.is_participant(&convo.id, &stranger).unwrap());
    }
}
