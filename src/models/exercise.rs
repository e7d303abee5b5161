use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::from_row::json_list;
use super::FromSqliteRow;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub instructions: Option<String>,
    pub tags: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            muscle_group: row.get("muscle_group")?,
            equipment: row.get("equipment")?,
            video_url: row.get("video_url")?,
            image_url: row.get("image_url")?,
            instructions: row.get("instructions")?,
            tags: json_list(row, "tags")?,
            created_by: row.get("created_by")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Body of both create and full update.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseInput {
    pub name: String,
    pub muscle_group: String,
    pub equipment: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExerciseInput {
    /// Trim text fields, drop blank optionals and normalise tags.
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.muscle_group = self.muscle_group.trim().to_lowercase();

        if self.name.is_empty() {
            return Err(AppError::Validation("Exercise name is required".to_string()));
        }
        if self.muscle_group.is_empty() {
            return Err(AppError::Validation("Muscle group is required".to_string()));
        }

        self.equipment = blank_to_none(self.equipment);
        self.video_url = blank_to_none(self.video_url);
        self.image_url = blank_to_none(self.image_url);
        self.instructions = blank_to_none(self.instructions);
        self.tags = normalize_tags(&self.tags);
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExerciseFilter {
    pub muscle_group: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl ExerciseFilter {
    pub fn matches(&self, exercise: &Exercise) -> bool {
        if let Some(group) = self.muscle_group.as_deref().filter(|g| !g.is_empty()) {
            if !exercise.muscle_group.eq_ignore_ascii_case(group) {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !exercise
                .name
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let tag = tag.to_lowercase();
            if !exercise.tags.iter().any(|t| *t == tag) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
