use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, StaffUser};
use crate::models::assignment::check_transition;
use crate::models::{AssignWorkout, DailyWorkoutLog, UpdateAssignmentStatus};
use crate::repositories::{AssignmentRepository, UserRepository, WorkoutRepository};

#[derive(Clone)]
pub struct AssignmentsState {
    pub assignment_repo: AssignmentRepository,
    pub workout_repo: WorkoutRepository,
    pub user_repo: UserRepository,
}

impl AssignmentsState {
    async fn accessible(&self, auth_user: &AuthUser, id: &str) -> Result<DailyWorkoutLog> {
        let assignment = self
            .assignment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment"))?;
        if !auth_user.can_act_for(&assignment.user_id) {
            return Err(AppError::not_found("Assignment"));
        }
        Ok(assignment)
    }
}

pub async fn list_mine(
    State(state): State<AssignmentsState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<DailyWorkoutLog>>> {
    Ok(Json(state.assignment_repo.find_by_user(&auth_user.id).await?))
}

pub async fn list_for_user(
    State(state): State<AssignmentsState>,
    _staff: StaffUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<DailyWorkoutLog>>> {
    Ok(Json(state.assignment_repo.find_by_user(&user_id).await?))
}

pub async fn assign(
    State(state): State<AssignmentsState>,
    auth_user: AuthUser,
    Json(form): Json<AssignWorkout>,
) -> Result<Response> {
    let user_id = form.user_id.unwrap_or_else(|| auth_user.id.clone());
    if !auth_user.can_act_for(&user_id) {
        return Err(AppError::Forbidden(
            "Only staff can assign workouts to other users".to_string(),
        ));
    }

    state
        .user_repo
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    state
        .workout_repo
        .find_by_id(&form.workout_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;

    let assigned_on = form
        .assigned_on
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let assignment = state
        .assignment_repo
        .assign(&user_id, &form.workout_id, &auth_user.id, assigned_on)
        .await?;
    tracing::info!(
        "{} assigned workout {} to user {}",
        auth_user.email,
        assignment.workout_title,
        user_id
    );

    Ok((StatusCode::CREATED, Json(assignment)).into_response())
}

pub async fn update_status(
    State(state): State<AssignmentsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(form): Json<UpdateAssignmentStatus>,
) -> Result<Json<DailyWorkoutLog>> {
    let assignment = state.accessible(&auth_user, &id).await?;
    check_transition(assignment.status, form.status)?;

    let updated = state
        .assignment_repo
        .update_status(&id, form.status)
        .await?
        .ok_or_else(|| AppError::not_found("Assignment"))?;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AssignmentsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.accessible(&auth_user, &id).await?;
    if !state.assignment_repo.delete(&id).await? {
        return Err(AppError::not_found("Assignment"));
    }
    Ok(StatusCode::NO_CONTENT)
}
