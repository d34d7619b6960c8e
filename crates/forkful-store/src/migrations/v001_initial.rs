//! v001 -- Initial schema creation.
//!
//! Creates `users` and `restaurants`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (profiles mirrored from the identity provider)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- opaque identity-provider id
    display_name TEXT,
    email        TEXT,
    created_at   TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Restaurants
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS restaurants (
    id                 TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name               TEXT NOT NULL,
    latitude           REAL NOT NULL,
    longitude          REAL NOT NULL,
    opening_time       TEXT NOT NULL,              -- HH:MM:SS
    closing_time       TEXT NOT NULL,              -- HH:MM:SS
    tags               TEXT NOT NULL DEFAULT '[]', -- JSON array
    recommended_dishes TEXT NOT NULL DEFAULT '[]', -- JSON array
    user_id            TEXT NOT NULL,              -- FK -> users(id)
    created_at         TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_restaurants_user_created
    ON restaurants(user_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
