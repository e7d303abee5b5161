use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::workout_session::{estimate_calories, MAX_PLAUSIBLE_SESSION_SECS};
use crate::models::{
    CompleteExercise, FinishSession, SessionDetail, SessionHistory, SessionProgress,
    StartSession, WorkoutSession,
};
use crate::repositories::{SessionFinish, TrainingRepository, UserRepository, WorkoutRepository};

const PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct TrainingState {
    pub training_repo: TrainingRepository,
    pub workout_repo: WorkoutRepository,
    pub user_repo: UserRepository,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    page: Option<i64>,
}

impl TrainingState {
    /// Sessions of other users are reported as missing.
    async fn owned_session(&self, auth_user: &AuthUser, id: &str) -> Result<WorkoutSession> {
        let session = self
            .training_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))?;
        if session.user_id != auth_user.id {
            return Err(AppError::not_found("Session"));
        }
        Ok(session)
    }

    async fn progress_of(&self, session: &WorkoutSession) -> Result<SessionProgress> {
        let planned: Vec<String> = self
            .workout_repo
            .find_exercises_for_day(&session.day_id)
            .await?
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        let logged: Vec<String> = self
            .training_repo
            .find_logs(&session.id)
            .await?
            .into_iter()
            .filter_map(|log| log.workout_exercise_id)
            .collect();
        Ok(SessionProgress::reconcile(&planned, &logged))
    }
}

pub async fn history(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SessionHistory>> {
    let total = state.training_repo.count_by_user(&auth_user.id).await?;
    let total_pages = (total + PER_PAGE - 1) / PER_PAGE;
    let page = query.page.unwrap_or(1).clamp(1, total_pages.max(1));
    let offset = (page - 1) * PER_PAGE;

    let sessions = state
        .training_repo
        .find_by_user_paginated(&auth_user.id, PER_PAGE, offset)
        .await?;

    Ok(Json(SessionHistory {
        sessions,
        page,
        total_pages,
    }))
}

pub async fn start(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Json(form): Json<StartSession>,
) -> Result<Response> {
    let day = state
        .workout_repo
        .find_day(&form.day_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout day"))?;

    let (session, resumed) = state.training_repo.start(&auth_user.id, &day).await?;
    if resumed {
        tracing::debug!("Resuming session {} for {}", session.id, auth_user.email);
        return Ok(Json(session).into_response());
    }

    tracing::info!("{} started session {} ({})", auth_user.email, session.id, day.name);
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

pub async fn show(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>> {
    state.owned_session(&auth_user, &id).await?;
    let detail = state
        .training_repo
        .find_detail(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Session"))?;
    Ok(Json(detail))
}

pub async fn progress(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionProgress>> {
    let session = state.owned_session(&auth_user, &id).await?;
    Ok(Json(state.progress_of(&session).await?))
}

pub async fn complete_exercise(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path((id, workout_exercise_id)): Path<(String, String)>,
    Json(form): Json<CompleteExercise>,
) -> Result<Response> {
    form.validate()?;
    let session = state.owned_session(&auth_user, &id).await?;
    session.ensure_in_progress()?;

    let planned = state
        .workout_repo
        .find_workout_exercise(&workout_exercise_id)
        .await?
        .filter(|entry| entry.day_id == session.day_id)
        .ok_or_else(|| AppError::NotFound("Exercise is not part of this session".to_string()))?;

    let (log, created) = state
        .training_repo
        .complete_exercise(&session.id, &planned, form)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(log)).into_response())
}

pub async fn uncomplete_exercise(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path((id, workout_exercise_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let session = state.owned_session(&auth_user, &id).await?;
    session.ensure_in_progress()?;

    if !state
        .training_repo
        .uncomplete_exercise(&session.id, &workout_exercise_id)
        .await?
    {
        return Err(AppError::NotFound("Exercise was not completed".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn finish(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(form): Json<FinishSession>,
) -> Result<Json<WorkoutSession>> {
    form.validate()?;
    let session = state.owned_session(&auth_user, &id).await?;
    session.ensure_in_progress()?;

    let workout = state
        .workout_repo
        .find_by_id(&session.workout_id)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;
    let weight_kg = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .and_then(|user| user.weight_kg);

    let ended_at = Utc::now();
    let duration_seconds = (ended_at - session.started_at).num_seconds().max(0);
    if duration_seconds > MAX_PLAUSIBLE_SESSION_SECS {
        tracing::warn!(
            "Session {} was open for {}s; calorie estimate is likely inflated",
            session.id,
            duration_seconds
        );
    }
    let calories = estimate_calories(workout.difficulty, weight_kg, duration_seconds);

    let finished = state
        .training_repo
        .finish(
            &session.id,
            SessionFinish {
                ended_at,
                duration_seconds,
                calories,
                feeling: form.feeling,
                notes: form.notes.filter(|n| !n.trim().is_empty()),
            },
        )
        .await?
        .ok_or_else(|| AppError::BadRequest("Session is already finished".to_string()))?;

    tracing::info!(
        "{} finished session {} in {}s (~{} kcal)",
        auth_user.email,
        finished.id,
        duration_seconds,
        calories
    );
    Ok(Json(finished))
}

/// Abandons an open session or removes a finished one from history.
pub async fn delete(
    State(state): State<TrainingState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.training_repo.delete(&id, &auth_user.id).await? {
        return Err(AppError::not_found("Session"));
    }
    Ok(StatusCode::NO_CONTENT)
}
