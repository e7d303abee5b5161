use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, User};
use crate::session::SESSION_TTL_DAYS;

/// Login sessions backing the `session` cookie.
#[derive(Clone)]
pub struct SessionRepository {
    pool: DbPool,
}

impl SessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new session for a user. Returns the session token.
    pub async fn create(&self, user_id: &str) -> Result<String> {
        let pool = self.pool.clone();
        let token = Uuid::new_v4().to_string();
        let user_id = user_id.to_string();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(SESSION_TTL_DAYS);

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![token, user_id, now, expires_at],
            )?;
            Ok(token)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Resolve a token to its user. An expired session is deleted on sight.
    pub async fn find_user(&self, token: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let token = token.to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let expires_at: Option<DateTime<Utc>> = conn
                .query_row(
                    "SELECT expires_at FROM sessions WHERE token = ?",
                    [&token],
                    |row| row.get(0),
                )
                .optional()?;

            match expires_at {
                Some(expires_at) if expires_at > now => {
                    let mut stmt = conn.prepare(
                        "SELECT u.* FROM users u JOIN sessions s ON s.user_id = u.id
                         WHERE s.token = ?",
                    )?;
                    Ok(stmt.query_row([&token], User::from_row).optional()?)
                }
                Some(_) => {
                    conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
                    Ok(None)
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Delete a single session (logout).
    pub async fn delete(&self, token: &str) -> Result<()> {
        let pool = self.pool.clone();
        let token = token.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute("DELETE FROM sessions WHERE token = ?", [&token])?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Sign a user out everywhere, optionally keeping the caller's own session.
    pub async fn delete_for_user(&self, user_id: &str, keep_token: Option<&str>) -> Result<usize> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let keep_token = keep_token.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = match keep_token {
                Some(keep) => conn.execute(
                    "DELETE FROM sessions WHERE user_id = ? AND token != ?",
                    rusqlite::params![user_id, keep],
                )?,
                None => conn.execute("DELETE FROM sessions WHERE user_id = ?", [&user_id])?,
            };
            Ok(rows)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Batch delete all expired sessions, returning how many were removed.
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let pool = self.pool.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                rusqlite::params![now],
            )?;
            Ok(rows)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
