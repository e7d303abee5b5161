use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, StaffUser};
use crate::models::{
    TodaysWorkout, Workout, WorkoutDay, WorkoutDayInput, WorkoutDetail, WorkoutExercise,
    WorkoutExerciseInput, WorkoutFilter, WorkoutInput,
};
use crate::repositories::{ExerciseRepository, WorkoutRepository};

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
}

#[derive(Deserialize)]
pub struct TodayQuery {
    date: Option<NaiveDate>,
}

impl WorkoutsState {
    async fn day_of(&self, workout_id: &str, day_id: &str) -> Result<WorkoutDay> {
        let day = self
            .workout_repo
            .find_day(day_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout day"))?;
        if day.workout_id != workout_id {
            return Err(AppError::not_found("Workout day"));
        }
        Ok(day)
    }

    async fn ensure_exercise_exists(&self, exercise_id: &str) -> Result<()> {
        self.exercise_repo
            .find_by_id(exercise_id)
            .await?
            .ok_or_else(|| AppError::Validation("Unknown exercise".to_string()))?;
        Ok(())
    }
}

// Workouts

pub async fn list(
    State(state): State<WorkoutsState>,
    _auth_user: AuthUser,
    Query(filter): Query<WorkoutFilter>,
) -> Result<Json<Vec<Workout>>> {
    Ok(Json(state.workout_repo.find_all(filter).await?))
}

pub async fn show(
    State(state): State<WorkoutsState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetail>> {
    let workout = state
        .workout_repo
        .find_detail(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;
    Ok(Json(workout))
}

/// The day of the plan scheduled for today (or `?date=`), `null` on rest days.
pub async fn today(
    State(state): State<WorkoutsState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<TodayQuery>,
) -> Result<Json<TodaysWorkout>> {
    let workout = state
        .workout_repo
        .find_detail(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;

    let date = query
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let day = workout.day_for(date).cloned();

    Ok(Json(TodaysWorkout {
        workout_id: workout.workout.id,
        date,
        day,
    }))
}

pub async fn create(
    State(state): State<WorkoutsState>,
    staff: StaffUser,
    Json(input): Json<WorkoutInput>,
) -> Result<Response> {
    let input = input.normalized()?;
    let workout = state.workout_repo.create(input, &staff.id).await?;
    tracing::info!("{} created workout {}", staff.email, workout.title);
    Ok((StatusCode::CREATED, Json(workout)).into_response())
}

pub async fn update(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(input): Json<WorkoutInput>,
) -> Result<Json<Workout>> {
    let input = input.normalized()?;
    let workout = state
        .workout_repo
        .update(&id, input)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;
    Ok(Json(workout))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    staff: StaffUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.workout_repo.delete(&id).await? {
        return Err(AppError::not_found("Workout"));
    }
    tracing::info!("{} deleted workout {}", staff.email, id);
    Ok(StatusCode::NO_CONTENT)
}

// Days

pub async fn add_day(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path(workout_id): Path<String>,
    Json(input): Json<WorkoutDayInput>,
) -> Result<Response> {
    let input = input.normalized()?;
    state
        .workout_repo
        .find_by_id(&workout_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;

    let day = state.workout_repo.add_day(&workout_id, input).await?;
    Ok((StatusCode::CREATED, Json(day)).into_response())
}

pub async fn update_day(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path((workout_id, day_id)): Path<(String, String)>,
    Json(input): Json<WorkoutDayInput>,
) -> Result<Json<WorkoutDay>> {
    let input = input.normalized()?;
    let day = state
        .workout_repo
        .update_day(&workout_id, &day_id, input)
        .await?
        .ok_or_else(|| AppError::not_found("Workout day"))?;
    Ok(Json(day))
}

pub async fn delete_day(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path((workout_id, day_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    if !state.workout_repo.delete_day(&workout_id, &day_id).await? {
        return Err(AppError::not_found("Workout day"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Workout exercises

pub async fn add_exercise(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path((workout_id, day_id)): Path<(String, String)>,
    Json(input): Json<WorkoutExerciseInput>,
) -> Result<Response> {
    let input = input.normalized()?;
    state.day_of(&workout_id, &day_id).await?;
    state.ensure_exercise_exists(&input.exercise_id).await?;

    let entry = state.workout_repo.add_exercise(&day_id, input).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

pub async fn update_exercise(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path((workout_id, day_id, id)): Path<(String, String, String)>,
    Json(input): Json<WorkoutExerciseInput>,
) -> Result<Json<WorkoutExercise>> {
    let input = input.normalized()?;
    state.day_of(&workout_id, &day_id).await?;
    state.ensure_exercise_exists(&input.exercise_id).await?;

    let entry = state
        .workout_repo
        .update_exercise(&day_id, &id, input)
        .await?
        .ok_or_else(|| AppError::not_found("Workout exercise"))?;
    Ok(Json(entry))
}

pub async fn remove_exercise(
    State(state): State<WorkoutsState>,
    _staff: StaffUser,
    Path((workout_id, day_id, id)): Path<(String, String, String)>,
) -> Result<StatusCode> {
    state.day_of(&workout_id, &day_id).await?;
    if !state.workout_repo.remove_exercise(&day_id, &id).await? {
        return Err(AppError::not_found("Workout exercise"));
    }
    Ok(StatusCode::NO_CONTENT)
}
