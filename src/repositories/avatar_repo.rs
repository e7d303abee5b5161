use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{Avatar, FromSqliteRow};

#[derive(Clone)]
pub struct AvatarRepository {
    pool: DbPool,
}

impl AvatarRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Avatar>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM avatars ORDER BY name")?;
            let avatars = stmt
                .query_map([], Avatar::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(avatars)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Avatar>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM avatars WHERE id = ?")?;
            let result = stmt.query_row([&id], Avatar::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, name: &str, url: &str) -> Result<Avatar> {
        let avatar = Avatar {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            url: url.trim().to_string(),
            created_at: Utc::now(),
        };
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO avatars (id, name, url, created_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![avatar.id, avatar.name, avatar.url, avatar.created_at],
            )?;
            Ok(avatar)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Profiles pointing at the avatar fall back to none.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM avatars WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
