use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

use super::OptionalExt;
use crate::Database;
use crate::models::{PostStatsRow, ReplyRow};
use transitionu_types::api::PostSort;
use transitionu_types::models::{SortOrder, VoteType};

/// Filters for the post listing. Vote and reply counts always come from
/// the vote/reply tables; `viewer` additionally resolves that user's own
/// vote on each post.
pub struct PostFilter<'a> {
    pub category: Option<&'a str>,
    pub author: Option<&'a str>,
    pub sort_by: PostSort,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u32,
    pub viewer: Option<&'a str>,
}

const POST_SELECT: &str = "
    SELECT p.id, p.user_id,
           CASE WHEN p.anonymous THEN NULL
                ELSE u.first_name || ' ' || u.last_name END AS author_name,
           p.title, p.content, p.category, p.anonymous,
           (SELECT COUNT(*) FROM forum_votes v
             WHERE v.post_id = p.id AND v.vote_type = 'upvote') AS upvotes,
           (SELECT COUNT(*) FROM forum_votes v
             WHERE v.post_id = p.id AND v.vote_type = 'downvote') AS downvotes,
           (SELECT COUNT(*) FROM forum_replies r WHERE r.post_id = p.id) AS reply_count,
           (SELECT v.vote_type FROM forum_votes v
             WHERE v.post_id = p.id AND v.user_id = ?1) AS user_vote,
           p.created_at, p.updated_at
    FROM forum_posts p
    LEFT JOIN users u ON p.user_id = u.id";

impl Database {
    pub fn create_post(
        &self,
        id: &str,
        user_id: Option<&str>,
        title: &str,
        content: &str,
        category: &str,
        anonymous: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO forum_posts (id, user_id, title, content, category, anonymous)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, user_id, title, content, category, anonymous],
            )?;
            Ok(())
        })
    }

    pub fn get_posts(&self, filter: &PostFilter<'_>) -> Result<Vec<PostStatsRow>> {
        self.with_conn(|conn| {
            let direction = match filter.order {
                SortOrder::Asc => "ASC",
                SortOrder::Desc => "DESC",
            };
            // sort key comes from an enum, never from the request string
            let sort_key = match filter.sort_by {
                PostSort::CreatedAt => "p.created_at",
                PostSort::Score => "(upvotes - downvotes)",
            };

            let sql = format!(
                "{POST_SELECT}
                 WHERE (?2 IS NULL OR p.category = ?2)
                   AND (?3 IS NULL OR p.user_id = ?3)
                 ORDER BY {sort_key} {direction}
                 LIMIT ?4 OFFSET ?5"
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![
                        filter.viewer,
                        filter.category,
                        filter.author,
                        filter.limit,
                        filter.offset,
                    ],
                    read_post,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_post(&self, post_id: &str, viewer: Option<&str>) -> Result<Option<PostStatsRow>> {
        self.with_conn(|conn| {
            let sql = format!("{POST_SELECT} WHERE p.id = ?2");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(rusqlite::params![viewer, post_id], read_post)
                .optional()
        })
    }

    /// Delete a post and everything hanging off it. Ownership is the
    /// caller's concern; this just removes the rows.
    pub fn delete_post(&self, post_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM forum_reply_votes WHERE reply_id IN
                     (SELECT id FROM forum_replies WHERE post_id = ?1)",
                [post_id],
            )?;
            tx.execute("DELETE FROM forum_replies WHERE post_id = ?1", [post_id])?;
            tx.execute("DELETE FROM forum_votes WHERE post_id = ?1", [post_id])?;
            tx.execute("DELETE FROM forum_posts WHERE id = ?1", [post_id])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Toggle a user's vote on a post. Voting the same way twice retracts
    /// the vote; voting the other way switches it in place. The UNIQUE
    /// (post_id, user_id) key backs the at-most-one-vote invariant.
    /// Returns the vote that is active after the toggle, if any.
    pub fn toggle_post_vote(
        &self,
        post_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> Result<Option<VoteType>> {
        self.with_conn_mut(|conn| {
            toggle_vote(
                conn,
                "forum_votes",
                "post_id",
                post_id,
                user_id,
                vote_type,
            )
        })
    }

    pub fn toggle_reply_vote(
        &self,
        reply_id: &str,
        user_id: &str,
        vote_type: VoteType,
    ) -> Result<Option<VoteType>> {
        self.with_conn_mut(|conn| {
            toggle_vote(
                conn,
                "forum_reply_votes",
                "reply_id",
                reply_id,
                user_id,
                vote_type,
            )
        })
    }

    pub fn create_reply(
        &self,
        id: &str,
        post_id: &str,
        user_id: Option<&str>,
        parent_reply_id: Option<&str>,
        content: &str,
        anonymous: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO forum_replies
                     (id, post_id, user_id, parent_reply_id, content, anonymous)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, post_id, user_id, parent_reply_id, content, anonymous],
            )?;
            Ok(())
        })
    }

    pub fn get_replies(&self, post_id: &str) -> Result<Vec<ReplyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.post_id, r.user_id,
                        CASE WHEN r.anonymous THEN NULL
                             ELSE u.first_name || ' ' || u.last_name END,
                        r.parent_reply_id, r.content, r.anonymous,
                        (SELECT COUNT(*) FROM forum_reply_votes v
                          WHERE v.reply_id = r.id AND v.vote_type = 'upvote'),
                        (SELECT COUNT(*) FROM forum_reply_votes v
                          WHERE v.reply_id = r.id AND v.vote_type = 'downvote'),
                        r.created_at
                 FROM forum_replies r
                 LEFT JOIN users u ON r.user_id = u.id
                 WHERE r.post_id = ?1
                 ORDER BY r.created_at ASC",
            )?;
            let rows = stmt
                .query_map([post_id], read_reply)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_reply(&self, reply_id: &str) -> Result<Option<ReplyRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.post_id, r.user_id,
                        CASE WHEN r.anonymous THEN NULL
                             ELSE u.first_name || ' ' || u.last_name END,
                        r.parent_reply_id, r.content, r.anonymous, 0, 0, r.created_at
                 FROM forum_replies r
                 LEFT JOIN users u ON r.user_id = u.id
                 WHERE r.id = ?1",
            )?;
            stmt.query_row([reply_id], read_reply).optional()
        })
    }

    pub fn delete_reply(&self, reply_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM forum_reply_votes WHERE reply_id = ?1 OR reply_id IN
                     (SELECT id FROM forum_replies WHERE parent_reply_id = ?1)",
                [reply_id],
            )?;
            tx.execute(
                "DELETE FROM forum_replies WHERE parent_reply_id = ?1",
                [reply_id],
            )?;
            tx.execute("DELETE FROM forum_replies WHERE id = ?1", [reply_id])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Case-insensitive substring search over post titles and bodies.
    pub fn search_posts(
        &self,
        query: &str,
        limit: u32,
        viewer: Option<&str>,
    ) -> Result<Vec<PostStatsRow>> {
        self.with_conn(|conn| {
            let pattern = format!("%{}%", query.to_lowercase());
            let sql = format!(
                "{POST_SELECT}
                 WHERE lower(p.title) LIKE ?2 OR lower(p.content) LIKE ?2
                 ORDER BY p.created_at DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![viewer, pattern, limit], read_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_user_posts(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM forum_posts WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn count_user_replies(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM forum_replies WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn toggle_vote(
    conn: &mut Connection,
    table: &str,
    target_column: &str,
    target_id: &str,
    user_id: &str,
    vote_type: VoteType,
) -> Result<Option<VoteType>> {
    let tx = conn.transaction()?;

    let existing: Option<String> = tx
        .query_row(
            &format!("SELECT vote_type FROM {table} WHERE {target_column} = ?1 AND user_id = ?2"),
            [target_id, user_id],
            |row| row.get(0),
        )
        .optional()?;

    let active = if existing.as_deref() == Some(vote_type.as_str()) {
        tx.execute(
            &format!("DELETE FROM {table} WHERE {target_column} = ?1 AND user_id = ?2"),
            [target_id, user_id],
        )?;
        None
    } else {
        tx.execute(
            &format!(
                "INSERT INTO {table} (id, {target_column}, user_id, vote_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT({target_column}, user_id)
                 DO UPDATE SET vote_type = excluded.vote_type"
            ),
            rusqlite::params![
                Uuid::new_v4().to_string(),
                target_id,
                user_id,
                vote_type.as_str()
            ],
        )?;
        Some(vote_type)
    };

    tx.commit()?;
    Ok(active)
}

fn read_post(row: &rusqlite::Row<'_>) -> std::result::Result<PostStatsRow, rusqlite::Error> {
    Ok(PostStatsRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        author_name: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        anonymous: row.get(6)?,
        upvotes: row.get(7)?,
        downvotes: row.get(8)?,
        reply_count: row.get(9)?,
        user_vote: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn read_reply(row: &rusqlite::Row<'_>) -> std::result::Result<ReplyRow, rusqlite::Error> {
    Ok(ReplyRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        author_name: row.get(3)?,
        parent_reply_id: row.get(4)?,
        content: row.get(5)?,
        anonymous: row.get(6)?,
        upvotes: row.get(7)?,
        downvotes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::PostFilter;
    use transitionu_types::api::PostSort;
    use transitionu_types::models::{SortOrder, VoteType};

    fn all_posts<'a>(viewer: Option<&'a str>) -> PostFilter<'a> {
        PostFilter {
            category: None,
            author: None,
            sort_by: PostSort::CreatedAt,
            order: SortOrder::Desc,
            limit: 20,
            offset: 0,
            viewer,
        }
    }

    #[test]
    fn voting_same_type_twice_retracts() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let voter = fixtures::user(&db, "voter@example.edu");
        let post = fixtures::post(&db, &author, "Where to find housing?", "housing");

        let active = db
            .toggle_post_vote(&post, &voter, VoteType::Upvote)
            .unwrap();
        assert_eq!(active, Some(VoteType::Upvote));

        let stats = db.get_post(&post, Some(voter.as_str())).unwrap().unwrap();
        assert_eq!(stats.upvotes, 1);
        assert_eq!(stats.user_vote.as_deref(), Some("upvote"));

        let active = db
            .toggle_post_vote(&post, &voter, VoteType::Upvote)
            .unwrap();
        assert_eq!(active, None);

        let stats = db.get_post(&post, Some(voter.as_str())).unwrap().unwrap();
        assert_eq!(stats.upvotes, 0);
        assert!(stats.user_vote.is_none());
    }

    #[test]
    fn voting_other_type_switches_in_place() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let voter = fixtures::user(&db, "voter@example.edu");
        let post = fixtures::post(&db, &author, "Best phone plan?", "finance");

        db.toggle_post_vote(&post, &voter, VoteType::Upvote).unwrap();
        let active = db
            .toggle_post_vote(&post, &voter, VoteType::Downvote)
            .unwrap();
        assert_eq!(active, Some(VoteType::Downvote));

        // exactly one row with the new type, never two
        let stats = db.get_post(&post, Some(voter.as_str())).unwrap().unwrap();
        assert_eq!(stats.upvotes, 0);
        assert_eq!(stats.downvotes, 1);
        assert_eq!(stats.user_vote.as_deref(), Some("downvote"));
    }

    #[test]
    fn post_counts_come_from_the_vote_table() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let post = fixtures::post(&db, &author, "Campus tips", "general");

        for i in 0..3 {
            let voter = fixtures::user(&db, &format!("up{i}@example.edu"));
            db.toggle_post_vote(&post, &voter, VoteType::Upvote).unwrap();
        }
        let downer = fixtures::user(&db, "down@example.edu");
        db.toggle_post_vote(&post, &downer, VoteType::Downvote)
            .unwrap();

        let stats = db.get_post(&post, None).unwrap().unwrap();
        assert_eq!(stats.upvotes, 3);
        assert_eq!(stats.downvotes, 1);
        assert!(stats.user_vote.is_none());
    }

    #[test]
    fn anonymous_posts_hide_the_author() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "shy@example.edu");
        let id = uuid::Uuid::new_v4().to_string();
        db.create_post(&id, Some(&author), "Feeling homesick", "content", "social", true)
            .unwrap();

        let post = db.get_post(&id, None).unwrap().unwrap();
        assert!(post.anonymous);
        assert!(post.author_name.is_none());
    }

    #[test]
    fn category_filter_and_score_sort() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let housing = fixtures::post(&db, &author, "Housing A", "housing");
        let _general = fixtures::post(&db, &author, "General B", "general");
        let housing2 = fixtures::post(&db, &author, "Housing C", "housing");

        let voter = fixtures::user(&db, "voter@example.edu");
        db.toggle_post_vote(&housing2, &voter, VoteType::Upvote)
            .unwrap();

        let mut filter = all_posts(None);
        filter.category = Some("housing");
        filter.sort_by = PostSort::Score;
        let posts = db.get_posts(&filter).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, housing2);
        assert_eq!(posts[1].id, housing);
    }

    #[test]
    fn replies_nest_one_level_and_count_on_post() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let replier = fixtures::user(&db, "replier@example.edu");
        let post = fixtures::post(&db, &author, "Question", "academics");

        let top = uuid::Uuid::new_v4().to_string();
        db.create_reply(&top, &post, Some(&replier), None, "Try the portal", false)
            .unwrap();
        let nested = uuid::Uuid::new_v4().to_string();
        db.create_reply(&nested, &post, Some(&author), Some(&top), "Thanks!", false)
            .unwrap();

        let replies = db.get_replies(&post).unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].parent_reply_id.as_deref(), Some(top.as_str()));

        let stats = db.get_post(&post, None).unwrap().unwrap();
        assert_eq!(stats.reply_count, 2);
    }

    #[test]
    fn delete_post_removes_votes_and_replies() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        let voter = fixtures::user(&db, "voter@example.edu");
        let post = fixtures::post(&db, &author, "To be deleted", "general");

        db.toggle_post_vote(&post, &voter, VoteType::Upvote).unwrap();
        let reply = uuid::Uuid::new_v4().to_string();
        db.create_reply(&reply, &post, Some(&voter), None, "reply", false)
            .unwrap();
        db.toggle_reply_vote(&reply, &author, VoteType::Upvote)
            .unwrap();

        db.delete_post(&post).unwrap();
        assert!(db.get_post(&post, None).unwrap().is_none());
        assert!(db.get_replies(&post).unwrap().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let db = fixtures::db();
        let author = fixtures::user(&db, "author@example.edu");
        fixtures::post(&db, &author, "SEVIS fee confusion", "visa");
        fixtures::post(&db, &author, "Gym hours", "general");

        let hits = db.search_posts("sevis", 20, None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "SEVIS fee confusion");
    }
}
