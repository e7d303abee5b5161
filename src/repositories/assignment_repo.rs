use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{AssignmentStatus, DailyWorkoutLog, FromSqliteRow};

const ASSIGNMENT_SELECT: &str = "SELECT a.*, w.title AS workout_title
     FROM daily_workout_logs a
     JOIN workouts w ON w.id = a.workout_id";

/// Daily workout logs: which plans a user follows and how far along they are.
#[derive(Clone)]
pub struct AssignmentRepository {
    pool: DbPool,
}

impl AssignmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fails with a conflict while the user still has an unfinished
    /// assignment of the same workout.
    pub async fn assign(
        &self,
        user_id: &str,
        workout_id: &str,
        assigned_by: &str,
        assigned_on: NaiveDate,
    ) -> Result<DailyWorkoutLog> {
        let pool = self.pool.clone();
        let id = Uuid::new_v4().to_string();
        let user_id = user_id.to_string();
        let workout_id = workout_id.to_string();
        let assigned_by = assigned_by.to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let active: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM daily_workout_logs
                 WHERE user_id = ? AND workout_id = ? AND status != 'completed'",
                [&user_id, &workout_id],
                |row| row.get(0),
            )?;
            if active {
                return Err(AppError::Conflict(
                    "Workout is already assigned to this user".to_string(),
                ));
            }

            tx.execute(
                "INSERT INTO daily_workout_logs
                    (id, user_id, workout_id, assigned_by, status, assigned_on, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    user_id,
                    workout_id,
                    assigned_by,
                    AssignmentStatus::Assigned.as_str(),
                    assigned_on,
                    now
                ],
            )?;
            let assignment = find_assignment(&tx, &id)?
                .ok_or_else(|| AppError::Internal("Inserted assignment vanished".to_string()))?;
            tx.commit()?;
            Ok(assignment)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<DailyWorkoutLog>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_assignment(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<DailyWorkoutLog>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(&format!(
                "{} WHERE a.user_id = ? ORDER BY a.assigned_on DESC, a.updated_at DESC",
                ASSIGNMENT_SELECT
            ))?;
            let assignments = stmt
                .query_map([&user_id], DailyWorkoutLog::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(assignments)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AssignmentStatus,
    ) -> Result<Option<DailyWorkoutLog>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let now = Utc::now();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE daily_workout_logs SET status = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![status.as_str(), now, id],
            )?;
            Ok(find_assignment(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM daily_workout_logs WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn find_assignment(conn: &Connection, id: &str) -> rusqlite::Result<Option<DailyWorkoutLog>> {
    let mut stmt = conn.prepare(&format!("{} WHERE a.id = ?", ASSIGNMENT_SELECT))?;
    stmt.query_row([id], DailyWorkoutLog::from_row).optional()
}
