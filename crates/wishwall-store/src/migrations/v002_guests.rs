use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Invited guests, keyed by the id in their invitation link
CREATE TABLE IF NOT EXISTS guests (
    id         TEXT PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    mobile     TEXT,
    status     TEXT NOT NULL DEFAULT 'pending',  -- pending | accepted
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
