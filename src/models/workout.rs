use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::exercise::blank_to_none;
use super::FromSqliteRow;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "beginner" => Difficulty::Beginner,
            "advanced" => Difficulty::Advanced,
            _ => Difficulty::Intermediate,
        }
    }

    /// Metabolic equivalent used for the session calorie estimate.
    pub fn met(&self) -> f64 {
        match self {
            Difficulty::Beginner => 3.5,
            Difficulty::Intermediate => 5.0,
            Difficulty::Advanced => 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub difficulty: Difficulty,
    pub days_per_week: i32,
    pub duration_weeks: Option<i32>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Workout {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let difficulty: String = row.get("difficulty")?;
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            difficulty: Difficulty::parse(&difficulty),
            days_per_week: row.get("days_per_week")?,
            duration_weeks: row.get("duration_weeks")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub id: String,
    pub workout_id: String,
    /// ISO weekday the day is trained on, Monday = 1.
    pub day_number: i32,
    pub name: String,
    pub notes: Option<String>,
}

impl FromSqliteRow for WorkoutDay {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            workout_id: row.get("workout_id")?,
            day_number: row.get("day_number")?,
            name: row.get("name")?,
            notes: row.get("notes")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: String,
    pub day_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub muscle_group: String,
    pub sets: i32,
    pub reps: String,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
    pub order_index: i32,
}

impl FromSqliteRow for WorkoutExercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            day_id: row.get("day_id")?,
            exercise_id: row.get("exercise_id")?,
            exercise_name: row.get("exercise_name")?,
            muscle_group: row.get("muscle_group")?,
            sets: row.get("sets")?,
            reps: row.get("reps")?,
            rest_seconds: row.get("rest_seconds")?,
            notes: row.get("notes")?,
            order_index: row.get("order_index")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDayDetail {
    #[serde(flatten)]
    pub day: WorkoutDay,
    pub exercises: Vec<WorkoutExercise>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub days: Vec<WorkoutDayDetail>,
}

impl WorkoutDetail {
    /// The day scheduled for `date`, or `None` on a rest day.
    pub fn day_for(&self, date: NaiveDate) -> Option<&WorkoutDayDetail> {
        let weekday = date.weekday().number_from_monday() as i32;
        self.days.iter().find(|d| d.day.day_number == weekday)
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkoutInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub days_per_week: i32,
    pub duration_weeks: Option<i32>,
}

impl WorkoutInput {
    pub fn normalized(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(AppError::Validation("Workout title is required".to_string()));
        }
        if !(1..=7).contains(&self.days_per_week) {
            return Err(AppError::Validation(
                "Days per week must be between 1 and 7".to_string(),
            ));
        }
        if matches!(self.duration_weeks, Some(w) if w < 1) {
            return Err(AppError::Validation(
                "Duration must be at least one week".to_string(),
            ));
        }
        self.description = blank_to_none(self.description);
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkoutDayInput {
    pub day_number: i32,
    pub name: String,
    pub notes: Option<String>,
}

impl WorkoutDayInput {
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(AppError::Validation("Day name is required".to_string()));
        }
        if !(1..=7).contains(&self.day_number) {
            return Err(AppError::Validation(
                "Day number must be between 1 and 7".to_string(),
            ));
        }
        self.notes = blank_to_none(self.notes);
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkoutExerciseInput {
    pub exercise_id: String,
    pub sets: i32,
    pub reps: String,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
    /// Appended after the last exercise of the day when omitted.
    pub order_index: Option<i32>,
}

impl WorkoutExerciseInput {
    pub fn normalized(mut self) -> Result<Self> {
        if self.sets < 1 {
            return Err(AppError::Validation("Sets must be at least 1".to_string()));
        }
        self.reps = self.reps.trim().to_string();
        if self.reps.is_empty() {
            return Err(AppError::Validation("Reps are required".to_string()));
        }
        if matches!(self.rest_seconds, Some(r) if r < 0) {
            return Err(AppError::Validation(
                "Rest cannot be negative".to_string(),
            ));
        }
        self.notes = blank_to_none(self.notes);
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkoutFilter {
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize)]
pub struct TodaysWorkout {
    pub workout_id: String,
    pub date: NaiveDate,
    pub day: Option<WorkoutDayDetail>,
}
