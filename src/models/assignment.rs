use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => AssignmentStatus::InProgress,
            "completed" => AssignmentStatus::Completed,
            _ => AssignmentStatus::Assigned,
        }
    }

    /// Status only moves forward; staying put is allowed.
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        next >= *self
    }
}

/// A workout plan assigned to a user, with its progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyWorkoutLog {
    pub id: String,
    pub user_id: String,
    pub workout_id: String,
    pub workout_title: String,
    pub assigned_by: Option<String>,
    pub status: AssignmentStatus,
    pub assigned_on: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for DailyWorkoutLog {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            workout_id: row.get("workout_id")?,
            workout_title: row.get("workout_title")?,
            assigned_by: row.get("assigned_by")?,
            status: AssignmentStatus::parse(&status),
            assigned_on: row.get("assigned_on")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignWorkout {
    /// Defaults to the caller.
    pub user_id: Option<String>,
    pub workout_id: String,
    pub assigned_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssignmentStatus {
    pub status: AssignmentStatus,
}

pub fn check_transition(from: AssignmentStatus, to: AssignmentStatus) -> Result<()> {
    if !from.can_transition_to(to) {
        return Err(AppError::BadRequest(format!(
            "Cannot move assignment from {} back to {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}
