use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, StaffUser};
use crate::models::{Exercise, ExerciseFilter, ExerciseInput};
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
}

pub async fn list(
    State(state): State<ExercisesState>,
    _auth_user: AuthUser,
    Query(filter): Query<ExerciseFilter>,
) -> Result<Json<Vec<Exercise>>> {
    Ok(Json(state.exercise_repo.find_all(filter).await?))
}

pub async fn muscle_groups(
    State(state): State<ExercisesState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.exercise_repo.muscle_groups().await?))
}

pub async fn show(
    State(state): State<ExercisesState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Exercise>> {
    let exercise = state
        .exercise_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise"))?;
    Ok(Json(exercise))
}

pub async fn create(
    State(state): State<ExercisesState>,
    staff: StaffUser,
    Json(input): Json<ExerciseInput>,
) -> Result<Response> {
    let input = input.normalized()?;
    let exercise = state.exercise_repo.create(input, &staff.id).await?;
    tracing::info!("{} created exercise {}", staff.email, exercise.name);
    Ok((StatusCode::CREATED, Json(exercise)).into_response())
}

pub async fn update(
    State(state): State<ExercisesState>,
    _staff: StaffUser,
    Path(id): Path<String>,
    Json(input): Json<ExerciseInput>,
) -> Result<Json<Exercise>> {
    let input = input.normalized()?;
    let exercise = state
        .exercise_repo
        .update(&id, input)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise"))?;
    Ok(Json(exercise))
}

pub async fn delete(
    State(state): State<ExercisesState>,
    staff: StaffUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.exercise_repo.delete(&id).await? {
        return Err(AppError::not_found("Exercise"));
    }
    tracing::info!("{} deleted exercise {}", staff.email, id);
    Ok(StatusCode::NO_CONTENT)
}
