use rusqlite::Connection;

const UP_SQL: &str = r#"
-- Restaurant galleries
CREATE TABLE IF NOT EXISTS restaurant_images (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    restaurant_id TEXT NOT NULL,              -- FK -> restaurants(id)
    image_url     TEXT NOT NULL,
    created_at    TEXT NOT NULL,              -- RFC-3339

    FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_restaurant_images_restaurant
    ON restaurant_images(restaurant_id, created_at ASC);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
