use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::user::normalize_email;
use crate::models::{FromSqliteRow, UpdateProfile, User, UserRole};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([&id], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let email = normalize_email(email);
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE email = ?")?;
            let result = stmt.query_row([&email], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at DESC")?;
            let users = stmt
                .query_map([], User::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User> {
        self.insert(email, password, display_name, Some(role)).await
    }

    /// Self sign-up: the very first account becomes the admin.
    pub async fn register(&self, email: &str, password: &str, display_name: &str) -> Result<User> {
        self.insert(email, password, display_name, None).await
    }

    async fn insert(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: Option<UserRole>,
    ) -> Result<User> {
        let password_hash = hash_password(password)?;
        let mut user = User {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            display_name: display_name.trim().to_string(),
            role: role.unwrap_or_default(),
            weight_kg: None,
            height_cm: None,
            birth_date: None,
            gender: None,
            goal: None,
            avatar_id: None,
            created_at: Utc::now(),
        };

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let taken: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM users WHERE email = ?",
                [&user.email],
                |row| row.get(0),
            )?;
            if taken {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }

            if role.is_none() {
                let existing: i64 =
                    tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                if existing == 0 {
                    user.role = UserRole::Admin;
                }
            }

            tx.execute(
                "INSERT INTO users (id, email, password_hash, display_name, role, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.display_name,
                    user.role.as_str(),
                    user.created_at
                ],
            )?;
            tx.commit()?;
            Ok(user)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = self.find_by_email(email).await?;

        match user {
            Some(user) => {
                if verify_password(password, &user.password_hash)? {
                    Ok(Some(user))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM users WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_role(&self, id: &str, role: UserRole) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE users SET role = ? WHERE id = ?",
                rusqlite::params![role.as_str(), id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Apply the fields present in `update`; absent fields keep their value.
    pub async fn update_profile(&self, id: &str, update: UpdateProfile) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE users SET
                    display_name = COALESCE(?, display_name),
                    weight_kg = COALESCE(?, weight_kg),
                    height_cm = COALESCE(?, height_cm),
                    birth_date = COALESCE(?, birth_date),
                    gender = COALESCE(?, gender),
                    goal = COALESCE(?, goal),
                    avatar_id = COALESCE(?, avatar_id)
                 WHERE id = ?",
                rusqlite::params![
                    update.display_name.map(|n| n.trim().to_string()),
                    update.weight_kg,
                    update.height_cm,
                    update.birth_date,
                    update.gender,
                    update.goal,
                    update.avatar_id,
                    id
                ],
            )?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([&id], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_password(&self, id: &str, new_password: &str) -> Result<bool> {
        let password_hash = hash_password(new_password)?;
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                rusqlite::params![password_hash, id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Fails with a conflict when another account already uses the address.
    pub async fn update_email(&self, id: &str, email: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let email = normalize_email(email);
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let taken: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM users WHERE email = ? AND id != ?",
                rusqlite::params![email, id],
                |row| row.get(0),
            )?;
            if taken {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            let rows = tx.execute(
                "UPDATE users SET email = ? WHERE id = ?",
                rusqlite::params![email, id],
            )?;
            tx.commit()?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::PasswordHash)?
        .to_string();
    Ok(password_hash)
}

pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AppError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
