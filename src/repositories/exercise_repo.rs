use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{Exercise, ExerciseFilter, ExerciseInput, FromSqliteRow};

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Exercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM exercises WHERE id = ?")?;
            let result = stmt.query_row([&id], Exercise::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_all(&self, filter: ExerciseFilter) -> Result<Vec<Exercise>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM exercises ORDER BY muscle_group, name")?;
            let exercises = stmt
                .query_map([], Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(exercises
                .into_iter()
                .filter(|exercise| filter.matches(exercise))
                .collect())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn muscle_groups(&self) -> Result<Vec<String>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT DISTINCT muscle_group FROM exercises ORDER BY muscle_group")?;
            let groups = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(groups)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, input: ExerciseInput, created_by: &str) -> Result<Exercise> {
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            muscle_group: input.muscle_group,
            equipment: input.equipment,
            video_url: input.video_url,
            image_url: input.image_url,
            instructions: input.instructions,
            tags: input.tags,
            created_by: Some(created_by.to_string()),
            created_at: Utc::now(),
        };
        let tags = serde_json::to_string(&exercise.tags)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            ensure_name_free(&conn, &exercise.name, None)?;
            conn.execute(
                "INSERT INTO exercises
                    (id, name, muscle_group, equipment, video_url, image_url, instructions, tags, created_by, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    exercise.id,
                    exercise.name,
                    exercise.muscle_group,
                    exercise.equipment,
                    exercise.video_url,
                    exercise.image_url,
                    exercise.instructions,
                    tags,
                    exercise.created_by,
                    exercise.created_at
                ],
            )?;
            Ok(exercise)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update(&self, id: &str, input: ExerciseInput) -> Result<Option<Exercise>> {
        let tags =
            serde_json::to_string(&input.tags).map_err(|e| AppError::Internal(e.to_string()))?;
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            ensure_name_free(&conn, &input.name, Some(&id))?;
            let rows = conn.execute(
                "UPDATE exercises SET
                    name = ?, muscle_group = ?, equipment = ?, video_url = ?,
                    image_url = ?, instructions = ?, tags = ?
                 WHERE id = ?",
                rusqlite::params![
                    input.name,
                    input.muscle_group,
                    input.equipment,
                    input.video_url,
                    input.image_url,
                    input.instructions,
                    tags,
                    id
                ],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare("SELECT * FROM exercises WHERE id = ?")?;
            Ok(stmt.query_row([&id], Exercise::from_row).optional()?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Exercises still referenced by a workout plan or a session log cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let in_use: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workout_exercises WHERE exercise_id = ?",
                [&id],
                |row| row.get(0),
            )?;
            if in_use > 0 {
                return Err(AppError::Conflict(format!(
                    "Exercise is used by {} workout plan entries",
                    in_use
                )));
            }
            let logged: i64 = conn.query_row(
                "SELECT COUNT(*) FROM session_logs WHERE exercise_id = ?",
                [&id],
                |row| row.get(0),
            )?;
            if logged > 0 {
                return Err(AppError::Conflict(format!(
                    "Exercise is recorded in {} session logs",
                    logged
                )));
            }
            let rows = conn.execute("DELETE FROM exercises WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn ensure_name_free(conn: &rusqlite::Connection, name: &str, except_id: Option<&str>) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM exercises WHERE name = ? COLLATE NOCASE AND id != ?",
        rusqlite::params![name, except_id.unwrap_or("")],
        |row| row.get(0),
    )?;
    if taken {
        return Err(AppError::Conflict(format!(
            "An exercise named '{}' already exists",
            name
        )));
    }
    Ok(())
}
