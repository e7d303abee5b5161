use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    CompleteExercise, FromSqliteRow, SessionDetail, SessionLog, SessionStatus, StatsSummary,
    WorkoutDay, WorkoutExercise, WorkoutSession,
};

const SESSION_LOG_SELECT: &str = "SELECT l.*, e.name AS exercise_name
     FROM session_logs l
     JOIN exercises e ON e.id = l.exercise_id";

/// Values written when a session is finished.
#[derive(Debug, Clone)]
pub struct SessionFinish {
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub calories: i64,
    pub feeling: Option<i32>,
    pub notes: Option<String>,
}

/// Workout sessions and the per-exercise logs recorded during them.
#[derive(Clone)]
pub struct TrainingRepository {
    pool: DbPool,
}

impl TrainingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resume the user's open session for `day`, or open a new one.
    ///
    /// Returns the session and whether it was resumed. Opening a session
    /// moves a pending assignment of the workout to `in_progress`.
    pub async fn start(&self, user_id: &str, day: &WorkoutDay) -> Result<(WorkoutSession, bool)> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let day = day.clone();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;

            let existing = {
                let mut stmt = tx.prepare(
                    "SELECT * FROM workout_sessions
                     WHERE user_id = ? AND day_id = ? AND status = 'in_progress'
                     ORDER BY started_at DESC LIMIT 1",
                )?;
                let found = stmt
                    .query_row([&user_id, &day.id], WorkoutSession::from_row)
                    .optional()?;
                found
            };
            if let Some(session) = existing {
                return Ok((session, true));
            }

            let session = WorkoutSession {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.clone(),
                workout_id: day.workout_id.clone(),
                day_id: day.id.clone(),
                status: SessionStatus::InProgress,
                started_at: now,
                ended_at: None,
                duration_seconds: None,
                calories: None,
                feeling: None,
                notes: None,
            };
            tx.execute(
                "INSERT INTO workout_sessions (id, user_id, workout_id, day_id, status, started_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    session.id,
                    session.user_id,
                    session.workout_id,
                    session.day_id,
                    session.status.as_str(),
                    session.started_at
                ],
            )?;
            let promoted = tx.execute(
                "UPDATE daily_workout_logs SET status = 'in_progress', updated_at = ?
                 WHERE user_id = ? AND workout_id = ? AND status = 'assigned'",
                rusqlite::params![now, user_id, session.workout_id],
            )?;
            tx.commit()?;

            if promoted > 0 {
                tracing::debug!(
                    "Assignment of workout {} for user {} is now in progress",
                    session.workout_id,
                    user_id
                );
            }
            Ok((session, false))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WorkoutSession>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_session(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_detail(&self, id: &str) -> Result<Option<SessionDetail>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let Some(session) = find_session(&conn, &id)? else {
                return Ok(None);
            };
            let (workout_title, day_name): (String, String) = conn.query_row(
                "SELECT w.title, d.name FROM workout_days d
                 JOIN workouts w ON w.id = d.workout_id
                 WHERE d.id = ?",
                [&session.day_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let logs = session_logs(&conn, &id)?;
            Ok(Some(SessionDetail {
                session,
                workout_title,
                day_name,
                logs,
            }))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_logs(&self, session_id: &str) -> Result<Vec<SessionLog>> {
        let pool = self.pool.clone();
        let session_id = session_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(session_logs(&conn, &session_id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Record a planned exercise as done. Completing it twice keeps the first log.
    ///
    /// Returns the log and whether it was newly created.
    pub async fn complete_exercise(
        &self,
        session_id: &str,
        planned: &WorkoutExercise,
        input: CompleteExercise,
    ) -> Result<(SessionLog, bool)> {
        let pool = self.pool.clone();
        let session_id = session_id.to_string();
        let planned = planned.clone();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            // Concurrent completions race on the unique key; the loser keeps the winner's log
            let inserted = conn.execute(
                "INSERT INTO session_logs
                    (id, session_id, workout_exercise_id, exercise_id, sets_completed, reps, weight_kg, notes, completed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (session_id, workout_exercise_id) DO NOTHING",
                rusqlite::params![
                    id,
                    session_id,
                    planned.id,
                    planned.exercise_id,
                    input.sets_completed.unwrap_or(planned.sets),
                    input.reps,
                    input.weight_kg,
                    input.notes,
                    now
                ],
            )?;
            let log = find_log(&conn, &session_id, &planned.id)?
                .ok_or_else(|| AppError::Internal("Session log vanished".to_string()))?;
            Ok((log, inserted > 0))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn uncomplete_exercise(
        &self,
        session_id: &str,
        workout_exercise_id: &str,
    ) -> Result<bool> {
        let pool = self.pool.clone();
        let session_id = session_id.to_string();
        let workout_exercise_id = workout_exercise_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM session_logs WHERE session_id = ? AND workout_exercise_id = ?",
                rusqlite::params![session_id, workout_exercise_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Close an in-progress session. Returns `None` if it was not open.
    pub async fn finish(&self, id: &str, finish: SessionFinish) -> Result<Option<WorkoutSession>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workout_sessions SET
                    status = 'completed', ended_at = ?, duration_seconds = ?,
                    calories = ?, feeling = ?, notes = ?
                 WHERE id = ? AND status = 'in_progress'",
                rusqlite::params![
                    finish.ended_at,
                    finish.duration_seconds,
                    finish.calories,
                    finish.feeling,
                    finish.notes,
                    id
                ],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            Ok(find_session(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Deletes the session and its logs, whether open or finished.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workout_sessions WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_user_paginated(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WorkoutSession>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workout_sessions WHERE user_id = ?
                 ORDER BY started_at DESC LIMIT ? OFFSET ?",
            )?;
            let sessions = stmt
                .query_map(rusqlite::params![user_id, limit, offset], WorkoutSession::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sessions)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM workout_sessions WHERE user_id = ?",
                [&user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Totals over the user's completed sessions.
    pub async fn summary(
        &self,
        user_id: &str,
        week_start: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<StatsSummary> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let (
                total_sessions,
                sessions_this_week,
                sessions_this_month,
                total_calories,
                total_seconds,
                average_feeling,
            ) = conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(started_at >= ?), 0),
                    COALESCE(SUM(started_at >= ?), 0),
                    COALESCE(SUM(calories), 0),
                    COALESCE(SUM(duration_seconds), 0),
                    AVG(feeling)
                 FROM workout_sessions
                 WHERE user_id = ? AND status = 'completed'",
                rusqlite::params![week_start, month_start, user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                    ))
                },
            )?;
            let completed_assignments: i64 = conn.query_row(
                "SELECT COUNT(*) FROM daily_workout_logs WHERE user_id = ? AND status = 'completed'",
                [&user_id],
                |row| row.get(0),
            )?;

            Ok(StatsSummary {
                total_sessions,
                sessions_this_week,
                sessions_this_month,
                total_calories,
                total_minutes: total_seconds / 60,
                average_feeling,
                completed_assignments,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn find_session(conn: &Connection, id: &str) -> rusqlite::Result<Option<WorkoutSession>> {
    let mut stmt = conn.prepare("SELECT * FROM workout_sessions WHERE id = ?")?;
    stmt.query_row([id], WorkoutSession::from_row).optional()
}

fn find_log(
    conn: &Connection,
    session_id: &str,
    workout_exercise_id: &str,
) -> rusqlite::Result<Option<SessionLog>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE l.session_id = ? AND l.workout_exercise_id = ?",
        SESSION_LOG_SELECT
    ))?;
    stmt.query_row([session_id, workout_exercise_id], SessionLog::from_row)
        .optional()
}

fn session_logs(conn: &Connection, session_id: &str) -> rusqlite::Result<Vec<SessionLog>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE l.session_id = ? ORDER BY l.completed_at",
        SESSION_LOG_SELECT
    ))?;
    let logs = stmt
        .query_map([session_id], SessionLog::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>();
    logs
}
