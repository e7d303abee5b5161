use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::workout::Difficulty;
use super::FromSqliteRow;
use crate::error::{AppError, Result};

/// Body weight assumed when the profile has none.
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Sessions open longer than this were most likely forgotten, not trained.
pub const MAX_PLAUSIBLE_SESSION_SECS: i64 = 12 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => SessionStatus::Completed,
            _ => SessionStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub user_id: String,
    pub workout_id: String,
    pub day_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub calories: Option<i64>,
    pub feeling: Option<i32>,
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    pub fn ensure_in_progress(&self) -> Result<()> {
        if !self.is_in_progress() {
            return Err(AppError::BadRequest(
                "Session is already finished".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromSqliteRow for WorkoutSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            workout_id: row.get("workout_id")?,
            day_id: row.get("day_id")?,
            status: SessionStatus::parse(&status),
            started_at: row.get("started_at")?,
            ended_at: row.get("ended_at")?,
            duration_seconds: row.get("duration_seconds")?,
            calories: row.get("calories")?,
            feeling: row.get("feeling")?,
            notes: row.get("notes")?,
        })
    }
}

/// A completed exercise within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: String,
    pub session_id: String,
    /// `None` once the planned entry has been removed from the workout.
    pub workout_exercise_id: Option<String>,
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets_completed: i32,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl FromSqliteRow for SessionLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            workout_exercise_id: row.get("workout_exercise_id")?,
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            sets_completed: row.get("sets_completed")?,
            reps: row.get("reps")?,
            weight_kg: row.get("weight_kg")?,
            notes: row.get("notes")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub workout_title: String,
    pub day_name: String,
    pub logs: Vec<SessionLog>,
}

/// Completion state of a session against the exercises planned for its day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub completed: usize,
    pub completed_ids: Vec<String>,
    pub remaining_ids: Vec<String>,
    pub is_complete: bool,
}

impl SessionProgress {
    /// `planned` keeps the day's order; logs for exercises no longer in the
    /// plan are ignored.
    pub fn reconcile(planned: &[String], logged: &[String]) -> Self {
        let logged: HashSet<&str> = logged.iter().map(String::as_str).collect();
        let (completed_ids, remaining_ids): (Vec<String>, Vec<String>) = planned
            .iter()
            .cloned()
            .partition(|id| logged.contains(id.as_str()));

        Self {
            total: planned.len(),
            completed: completed_ids.len(),
            is_complete: !planned.is_empty() && remaining_ids.is_empty(),
            completed_ids,
            remaining_ids,
        }
    }
}

/// `MET × weight × hours`, rounded to whole kilocalories.
pub fn estimate_calories(difficulty: Difficulty, weight_kg: Option<f64>, duration_seconds: i64) -> i64 {
    let weight = weight_kg.filter(|w| *w > 0.0).unwrap_or(DEFAULT_WEIGHT_KG);
    let hours = duration_seconds.max(0) as f64 / 3600.0;
    (difficulty.met() * weight * hours).round() as i64
}

#[derive(Debug, Deserialize)]
pub struct StartSession {
    pub day_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteExercise {
    pub sets_completed: Option<i32>,
    pub reps: Option<i32>,
    pub weight_kg: Option<f64>,
    pub notes: Option<String>,
}

impl CompleteExercise {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.sets_completed, Some(s) if s < 0) {
            return Err(AppError::Validation("Sets cannot be negative".to_string()));
        }
        if matches!(self.reps, Some(r) if r < 0) {
            return Err(AppError::Validation("Reps cannot be negative".to_string()));
        }
        if matches!(self.weight_kg, Some(w) if w < 0.0) {
            return Err(AppError::Validation("Weight cannot be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FinishSession {
    pub feeling: Option<i32>,
    pub notes: Option<String>,
}

impl FinishSession {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.feeling, Some(f) if !(1..=5).contains(&f)) {
            return Err(AppError::Validation(
                "Feeling must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SessionHistory {
    pub sessions: Vec<WorkoutSession>,
    pub page: i64,
    pub total_pages: i64,
}
