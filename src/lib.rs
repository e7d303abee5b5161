pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod storage;
pub mod version;

use axum::Router;

use db::DbPool;
use handlers::{assignments, auth, avatars, exercises, health, sessions, stats, users, workouts};
use repositories::{
    AssignmentRepository, AvatarRepository, ExerciseRepository, SessionRepository,
    TrainingRepository, UserRepository, WorkoutRepository,
};
use routes::AppStates;
use storage::MediaStore;

/// Wire repositories into handler states and build the router.
pub fn build_app(pool: DbPool, media: MediaStore) -> Router {
    let user_repo = UserRepository::new(pool.clone());
    let session_repo = SessionRepository::new(pool.clone());
    let exercise_repo = ExerciseRepository::new(pool.clone());
    let workout_repo = WorkoutRepository::new(pool.clone());
    let training_repo = TrainingRepository::new(pool.clone());
    let assignment_repo = AssignmentRepository::new(pool.clone());
    let avatar_repo = AvatarRepository::new(pool.clone());

    let states = AppStates {
        health: health::HealthState { pool },
        auth: auth::AuthState {
            user_repo: user_repo.clone(),
            session_repo: session_repo.clone(),
        },
        users: users::UsersState {
            user_repo: user_repo.clone(),
            session_repo: session_repo.clone(),
            avatar_repo: avatar_repo.clone(),
        },
        exercises: exercises::ExercisesState {
            exercise_repo: exercise_repo.clone(),
        },
        workouts: workouts::WorkoutsState {
            workout_repo: workout_repo.clone(),
            exercise_repo,
        },
        training: sessions::TrainingState {
            training_repo: training_repo.clone(),
            workout_repo: workout_repo.clone(),
            user_repo: user_repo.clone(),
        },
        assignments: assignments::AssignmentsState {
            assignment_repo,
            workout_repo,
            user_repo,
        },
        avatars: avatars::AvatarsState { avatar_repo, media },
        stats: stats::StatsState { training_repo },
    };

    routes::create_router(states, session_repo)
}
