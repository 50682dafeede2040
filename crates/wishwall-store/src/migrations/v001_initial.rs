//! v001 -- Initial schema creation.
//!
//! Creates the guestbook tables: `wishes`, `wish_likes` and `wish_replies`.
//! `wish_replies` has no reader or writer; it is kept so the schema matches
//! the hosted database the guestbook was first deployed on.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Wishes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS wishes (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    guest_id      TEXT NOT NULL,
    guest_name    TEXT NOT NULL,
    content       TEXT NOT NULL,               -- 1..=280 characters, trimmed
    image_url     TEXT,
    likes_count   INTEGER NOT NULL DEFAULT 0 CHECK (likes_count >= 0),
    replies_count INTEGER NOT NULL DEFAULT 0 CHECK (replies_count >= 0),
    is_approved   INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    created_at    TEXT NOT NULL,               -- RFC-3339, UTC, fixed width
    updated_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wishes_created
    ON wishes(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_wishes_approved_created
    ON wishes(is_approved, created_at DESC);

-- ----------------------------------------------------------------
-- Likes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS wish_likes (
    id         TEXT PRIMARY KEY NOT NULL,      -- UUID v4
    wish_id    TEXT NOT NULL,                  -- FK -> wishes(id)
    guest_id   TEXT NOT NULL,
    guest_name TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (wish_id) REFERENCES wishes(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_wish_likes_unique
    ON wish_likes(wish_id, guest_id);

-- ----------------------------------------------------------------
-- Replies (schema only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS wish_replies (
    id          TEXT PRIMARY KEY NOT NULL,
    wish_id     TEXT NOT NULL,
    guest_id    TEXT NOT NULL,
    guest_name  TEXT NOT NULL,
    content     TEXT NOT NULL,
    is_approved INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,

    FOREIGN KEY (wish_id) REFERENCES wishes(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
