use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, Result};
use crate::models::{
    FromSqliteRow, Workout, WorkoutDay, WorkoutDayDetail, WorkoutDayInput, WorkoutDetail,
    WorkoutExercise, WorkoutExerciseInput, WorkoutFilter, WorkoutInput,
};

const WORKOUT_EXERCISE_SELECT: &str = "SELECT we.*, e.name AS exercise_name, e.muscle_group
     FROM workout_exercises we
     JOIN exercises e ON e.id = we.exercise_id";

/// Workout plans with their days and per-day exercises.
#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // Workouts

    pub async fn find_all(&self, filter: WorkoutFilter) -> Result<Vec<Workout>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let workouts = match filter.difficulty {
                Some(difficulty) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM workouts WHERE difficulty = ? ORDER BY title",
                    )?;
                    let rows = stmt
                        .query_map([difficulty.as_str()], Workout::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare("SELECT * FROM workouts ORDER BY title")?;
                    let rows = stmt
                        .query_map([], Workout::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };
            Ok(workouts)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_workout(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_detail(&self, id: &str) -> Result<Option<WorkoutDetail>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(load_detail(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, input: WorkoutInput, created_by: &str) -> Result<Workout> {
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            difficulty: input.difficulty,
            days_per_week: input.days_per_week,
            duration_weeks: input.duration_weeks,
            created_by: Some(created_by.to_string()),
            created_at: Utc::now(),
        };

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workouts
                    (id, title, description, difficulty, days_per_week, duration_weeks, created_by, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    workout.id,
                    workout.title,
                    workout.description,
                    workout.difficulty.as_str(),
                    workout.days_per_week,
                    workout.duration_weeks,
                    workout.created_by,
                    workout.created_at
                ],
            )?;
            Ok(workout)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update(&self, id: &str, input: WorkoutInput) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workouts SET
                    title = ?, description = ?, difficulty = ?, days_per_week = ?, duration_weeks = ?
                 WHERE id = ?",
                rusqlite::params![
                    input.title,
                    input.description,
                    input.difficulty.as_str(),
                    input.days_per_week,
                    input.duration_weeks,
                    id
                ],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            Ok(find_workout(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Deleting a plan cascades to its days, sessions and assignments.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM workouts WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    // Days

    pub async fn find_day(&self, day_id: &str) -> Result<Option<WorkoutDay>> {
        let pool = self.pool.clone();
        let day_id = day_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workout_days WHERE id = ?")?;
            let result = stmt.query_row([&day_id], WorkoutDay::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_day(&self, workout_id: &str, input: WorkoutDayInput) -> Result<WorkoutDay> {
        let day = WorkoutDay {
            id: Uuid::new_v4().to_string(),
            workout_id: workout_id.to_string(),
            day_number: input.day_number,
            name: input.name,
            notes: input.notes,
        };

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            ensure_day_number_free(&conn, &day.workout_id, day.day_number, None)?;
            conn.execute(
                "INSERT INTO workout_days (id, workout_id, day_number, name, notes)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![day.id, day.workout_id, day.day_number, day.name, day.notes],
            )?;
            Ok(day)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_day(
        &self,
        workout_id: &str,
        day_id: &str,
        input: WorkoutDayInput,
    ) -> Result<Option<WorkoutDay>> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        let day_id = day_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            ensure_day_number_free(&conn, &workout_id, input.day_number, Some(&day_id))?;
            let rows = conn.execute(
                "UPDATE workout_days SET day_number = ?, name = ?, notes = ?
                 WHERE id = ? AND workout_id = ?",
                rusqlite::params![input.day_number, input.name, input.notes, day_id, workout_id],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare("SELECT * FROM workout_days WHERE id = ?")?;
            Ok(stmt.query_row([&day_id], WorkoutDay::from_row).optional()?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete_day(&self, workout_id: &str, day_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        let day_id = day_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workout_days WHERE id = ? AND workout_id = ?",
                rusqlite::params![day_id, workout_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    // Workout exercises

    pub async fn find_exercises_for_day(&self, day_id: &str) -> Result<Vec<WorkoutExercise>> {
        let pool = self.pool.clone();
        let day_id = day_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(day_exercises(&conn, &day_id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_workout_exercise(&self, id: &str) -> Result<Option<WorkoutExercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Ok(find_workout_exercise(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn add_exercise(
        &self,
        day_id: &str,
        input: WorkoutExerciseInput,
    ) -> Result<WorkoutExercise> {
        let pool = self.pool.clone();
        let day_id = day_id.to_string();
        let id = Uuid::new_v4().to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let order_index = match input.order_index {
                Some(index) => index,
                None => conn.query_row(
                    "SELECT COALESCE(MAX(order_index) + 1, 0) FROM workout_exercises WHERE day_id = ?",
                    [&day_id],
                    |row| row.get(0),
                )?,
            };
            conn.execute(
                "INSERT INTO workout_exercises
                    (id, day_id, exercise_id, sets, reps, rest_seconds, notes, order_index)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    day_id,
                    input.exercise_id,
                    input.sets,
                    input.reps,
                    input.rest_seconds,
                    input.notes,
                    order_index
                ],
            )?;
            find_workout_exercise(&conn, &id)?
                .ok_or_else(|| AppError::Internal("Inserted workout exercise vanished".to_string()))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn update_exercise(
        &self,
        day_id: &str,
        id: &str,
        input: WorkoutExerciseInput,
    ) -> Result<Option<WorkoutExercise>> {
        let pool = self.pool.clone();
        let day_id = day_id.to_string();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE workout_exercises SET
                    exercise_id = ?, sets = ?, reps = ?, rest_seconds = ?, notes = ?,
                    order_index = COALESCE(?, order_index)
                 WHERE id = ? AND day_id = ?",
                rusqlite::params![
                    input.exercise_id,
                    input.sets,
                    input.reps,
                    input.rest_seconds,
                    input.notes,
                    input.order_index,
                    id,
                    day_id
                ],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            Ok(find_workout_exercise(&conn, &id)?)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn remove_exercise(&self, day_id: &str, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let day_id = day_id.to_string();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM workout_exercises WHERE id = ? AND day_id = ?",
                rusqlite::params![id, day_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

fn find_workout(conn: &Connection, id: &str) -> rusqlite::Result<Option<Workout>> {
    let mut stmt = conn.prepare("SELECT * FROM workouts WHERE id = ?")?;
    stmt.query_row([id], Workout::from_row).optional()
}

fn find_workout_exercise(conn: &Connection, id: &str) -> rusqlite::Result<Option<WorkoutExercise>> {
    let mut stmt = conn.prepare(&format!("{} WHERE we.id = ?", WORKOUT_EXERCISE_SELECT))?;
    stmt.query_row([id], WorkoutExercise::from_row).optional()
}

fn day_exercises(conn: &Connection, day_id: &str) -> rusqlite::Result<Vec<WorkoutExercise>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE we.day_id = ? ORDER BY we.order_index, e.name",
        WORKOUT_EXERCISE_SELECT
    ))?;
    let rows = stmt
        .query_map([day_id], WorkoutExercise::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>();
    rows
}

fn load_detail(conn: &Connection, id: &str) -> rusqlite::Result<Option<WorkoutDetail>> {
    let Some(workout) = find_workout(conn, id)? else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT * FROM workout_days WHERE workout_id = ? ORDER BY day_number")?;
    let days = stmt
        .query_map([id], WorkoutDay::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let days = days
        .into_iter()
        .map(|day| {
            let exercises = day_exercises(conn, &day.id)?;
            Ok(WorkoutDayDetail { day, exercises })
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(WorkoutDetail { workout, days }))
}

fn ensure_day_number_free(
    conn: &Connection,
    workout_id: &str,
    day_number: i32,
    except_id: Option<&str>,
) -> Result<()> {
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM workout_days WHERE workout_id = ? AND day_number = ? AND id != ?",
        rusqlite::params![workout_id, day_number, except_id.unwrap_or("")],
        |row| row.get(0),
    )?;
    if taken {
        return Err(AppError::Conflict(format!(
            "Workout already has a day {}",
            day_number
        )));
    }
    Ok(())
}
