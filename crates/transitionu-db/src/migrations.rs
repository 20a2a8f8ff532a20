use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            first_name    TEXT NOT NULL,
            last_name     TEXT NOT NULL,
            institution   TEXT,
            major         TEXT,
            visa_type     TEXT,
            home_country  TEXT,
            avatar_url    TEXT,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS checklist_categories (
            id             TEXT PRIMARY KEY,
            name           TEXT NOT NULL,
            description    TEXT,
            display_order  INTEGER NOT NULL,
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS checklist_items (
            id              TEXT PRIMARY KEY,
            category_id     TEXT REFERENCES checklist_categories(id),
            title           TEXT NOT NULL,
            description     TEXT,
            estimated_time  TEXT,
            difficulty      TEXT,
            display_order   INTEGER NOT NULL,
            required        INTEGER NOT NULL DEFAULT 1,
            visa_specific   INTEGER NOT NULL DEFAULT 0,
            visa_types      TEXT,
            resources       TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_checklist_items_category
            ON checklist_items(category_id, display_order);

        CREATE TABLE IF NOT EXISTS user_checklist_progress (
            id                 TEXT PRIMARY KEY,
            user_id            TEXT NOT NULL REFERENCES users(id),
            checklist_item_id  TEXT NOT NULL REFERENCES checklist_items(id),
            status             TEXT NOT NULL DEFAULT 'not_started',
            notes              TEXT,
            completed_at       TEXT,
            created_at         TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at         TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, checklist_item_id)
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            description   TEXT NOT NULL,
            icon_name     TEXT,
            category      TEXT NOT NULL,
            points        INTEGER NOT NULL DEFAULT 0,
            requirements  TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS user_achievements (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL REFERENCES users(id),
            achievement_id  TEXT NOT NULL REFERENCES achievements(id),
            earned_at       TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, achievement_id)
        );

        CREATE TABLE IF NOT EXISTS setup_guide_categories (
            id             TEXT PRIMARY KEY,
            name           TEXT NOT NULL,
            description    TEXT,
            icon_name      TEXT,
            display_order  INTEGER NOT NULL,
            created_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS setup_guides (
            id                     TEXT PRIMARY KEY,
            category_id            TEXT NOT NULL REFERENCES setup_guide_categories(id),
            title                  TEXT NOT NULL,
            content                TEXT NOT NULL,
            institution_specific   INTEGER NOT NULL DEFAULT 0,
            institutions           TEXT,
            major_specific         INTEGER NOT NULL DEFAULT 0,
            majors                 TEXT,
            display_order          INTEGER NOT NULL,
            resources              TEXT,
            created_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS faq_items (
            id          TEXT PRIMARY KEY,
            question    TEXT NOT NULL,
            answer      TEXT NOT NULL,
            category    TEXT NOT NULL,
            keywords    TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS forum_posts (
            id          TEXT PRIMARY KEY,
            user_id     TEXT REFERENCES users(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            category    TEXT NOT NULL,
            anonymous   INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_forum_posts_category
            ON forum_posts(category, created_at);

        CREATE TABLE IF NOT EXISTS forum_votes (
            id          TEXT PRIMARY KEY,
            post_id     TEXT NOT NULL REFERENCES forum_posts(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            vote_type   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(post_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_forum_votes_post
            ON forum_votes(post_id);

        CREATE TABLE IF NOT EXISTS forum_replies (
            id               TEXT PRIMARY KEY,
            post_id          TEXT NOT NULL REFERENCES forum_posts(id),
            user_id          TEXT REFERENCES users(id),
            parent_reply_id  TEXT REFERENCES forum_replies(id),
            content          TEXT NOT NULL,
            anonymous        INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_forum_replies_post
            ON forum_replies(post_id, created_at);

        CREATE TABLE IF NOT EXISTS forum_reply_votes (
            id          TEXT PRIMARY KEY,
            reply_id    TEXT NOT NULL REFERENCES forum_replies(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            vote_type   TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(reply_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            id               TEXT PRIMARY KEY,
            conversation_id  TEXT NOT NULL REFERENCES conversations(id),
            user_id          TEXT NOT NULL REFERENCES users(id),
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(conversation_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS direct_messages (
            id               TEXT PRIMARY KEY,
            conversation_id  TEXT REFERENCES conversations(id),
            sender_id        TEXT NOT NULL REFERENCES users(id),
            recipient_id     TEXT NOT NULL REFERENCES users(id),
            content          TEXT NOT NULL,
            read             INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_direct_messages_conversation
            ON direct_messages(conversation_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_direct_messages_recipient
            ON direct_messages(recipient_id, read);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
