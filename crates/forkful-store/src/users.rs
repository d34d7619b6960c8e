//! Profiles mirrored from the identity provider.

use forkful_shared::{User, UserId};
use rusqlite::params;

use crate::database::Database;
use crate::error::{not_found, Result};
use crate::rows::{encode_timestamp, timestamp_at};

impl Database {
    /// Insert or refresh a profile. The original `created_at` is kept.
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, display_name, email, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 display_name = excluded.display_name,
                 email        = excluded.email",
            params![
                user.id.as_str(),
                user.display_name,
                user.email,
                encode_timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, display_name, email, created_at FROM users WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    let id: String = row.get(0)?;
                    Ok(User {
                        id: UserId(id),
                        display_name: row.get(1)?,
                        email: row.get(2)?,
                        created_at: timestamp_at(row, 3)?,
                    })
                },
            )
            .map_err(not_found)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::StoreError;

    fn open() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn test_upsert_keeps_created_at() {
        let (db, _dir) = open();
        let first_seen = Utc::now() - Duration::days(3);
        let mut user = User {
            id: UserId::from("u1"),
            display_name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            created_at: first_seen,
        };
        db.upsert_user(&user).unwrap();

        user.display_name = Some("Ada L.".into());
        user.created_at = Utc::now();
        db.upsert_user(&user).unwrap();

        let loaded = db.get_user(&user.id).unwrap();
        assert_eq!(loaded.display_name.as_deref(), Some("Ada L."));
        assert_eq!(loaded.created_at, first_seen);
    }

    #[test]
    fn test_missing_user() {
        let (db, _dir) = open();
        assert!(matches!(db.get_user(&UserId::from("nobody")), Err(StoreError::NotFound)));
    }
}
