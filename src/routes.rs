use axum::{
    routing::{delete, get, post, put},
    Extension, Router,
};

use crate::handlers::{
    assignments, auth, avatars, exercises, health, sessions, stats, users, workouts,
};
use crate::repositories::SessionRepository;

/// Handler states, one per area of the API.
pub struct AppStates {
    pub health: health::HealthState,
    pub auth: auth::AuthState,
    pub users: users::UsersState,
    pub exercises: exercises::ExercisesState,
    pub workouts: workouts::WorkoutsState,
    pub training: sessions::TrainingState,
    pub assignments: assignments::AssignmentsState,
    pub avatars: avatars::AvatarsState,
    pub stats: stats::StatsState,
}

pub fn create_router(states: AppStates, session_repo: SessionRepository) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .with_state(states.health)
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .with_state(states.auth)
        // Profile and user administration
        .route("/api/profile", put(users::update_profile))
        .route("/api/profile/password", post(users::change_password))
        .route("/api/users", get(users::list))
        .route("/api/users/{id}", get(users::show).delete(users::delete))
        .route("/api/users/{id}/role", put(users::update_role))
        .route("/api/users/{id}/credentials", post(users::sync_credentials))
        .with_state(states.users)
        // Exercise catalog
        .route(
            "/api/exercises",
            get(exercises::list).post(exercises::create),
        )
        .route(
            "/api/exercises/muscle-groups",
            get(exercises::muscle_groups),
        )
        .route(
            "/api/exercises/{id}",
            get(exercises::show)
                .put(exercises::update)
                .delete(exercises::delete),
        )
        .with_state(states.exercises)
        // Workout plans
        .route("/api/workouts", get(workouts::list).post(workouts::create))
        .route(
            "/api/workouts/{id}",
            get(workouts::show)
                .put(workouts::update)
                .delete(workouts::delete),
        )
        .route("/api/workouts/{id}/today", get(workouts::today))
        .route("/api/workouts/{id}/days", post(workouts::add_day))
        .route(
            "/api/workouts/{id}/days/{day_id}",
            put(workouts::update_day).delete(workouts::delete_day),
        )
        .route(
            "/api/workouts/{id}/days/{day_id}/exercises",
            post(workouts::add_exercise),
        )
        .route(
            "/api/workouts/{id}/days/{day_id}/exercises/{entry_id}",
            put(workouts::update_exercise).delete(workouts::remove_exercise),
        )
        .with_state(states.workouts)
        // Training sessions
        .route(
            "/api/sessions",
            get(sessions::history).post(sessions::start),
        )
        .route(
            "/api/sessions/{id}",
            get(sessions::show).delete(sessions::delete),
        )
        .route("/api/sessions/{id}/progress", get(sessions::progress))
        .route("/api/sessions/{id}/finish", post(sessions::finish))
        .route(
            "/api/sessions/{id}/exercises/{entry_id}",
            post(sessions::complete_exercise).delete(sessions::uncomplete_exercise),
        )
        .with_state(states.training)
        // Daily workout logs
        .route(
            "/api/assignments",
            get(assignments::list_mine).post(assignments::assign),
        )
        .route("/api/assignments/{id}", delete(assignments::delete))
        .route(
            "/api/assignments/{id}/status",
            put(assignments::update_status),
        )
        .route(
            "/api/users/{id}/assignments",
            get(assignments::list_for_user),
        )
        .with_state(states.assignments)
        // Avatars and media
        .route("/api/avatars", get(avatars::list).post(avatars::create))
        .route("/api/avatars/{id}", delete(avatars::delete))
        .route("/api/media", post(avatars::upload))
        .route("/media/{name}", get(avatars::serve_media))
        .with_state(states.avatars)
        // Stats
        .route("/api/stats", get(stats::summary))
        .with_state(states.stats)
        .layer(Extension(session_repo))
}
