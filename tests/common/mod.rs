#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use fittrack::db::{create_memory_pool, DbPool};
use fittrack::migrations::run_migrations_for_tests;
use fittrack::models::{
    Difficulty, Exercise, ExerciseInput, User, UserRole, Workout, WorkoutDay, WorkoutDayInput,
    WorkoutExercise, WorkoutExerciseInput, WorkoutInput,
};
use fittrack::repositories::{
    ExerciseRepository, SessionRepository, UserRepository, WorkoutRepository,
};
use fittrack::storage::MediaStore;

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub fn create_test_app(pool: DbPool) -> Router {
    let media_dir = std::env::temp_dir().join(format!("fittrack-test-{}", uuid::Uuid::new_v4()));
    fittrack::build_app(pool, MediaStore::new(media_dir))
}

pub async fn create_test_user(pool: &DbPool, email: &str, password: &str, role: UserRole) -> User {
    let user_repo = UserRepository::new(pool.clone());
    let display_name = email.split('@').next().unwrap_or(email);
    user_repo
        .create(email, password, display_name, role)
        .await
        .unwrap()
}

pub async fn create_session_cookie(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    let token = session_repo.create(&user.id).await.unwrap();
    format!("session={}", token)
}

/// A user of the given role together with a ready-to-use `Cookie` header.
pub async fn login_as(pool: &DbPool, email: &str, role: UserRole) -> (User, String) {
    let user = create_test_user(pool, email, "password123", role).await;
    let cookie = create_session_cookie(pool, &user).await;
    (user, cookie)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or("").to_string()
}

/// Send a request with an optional cookie and JSON body; returns status and parsed body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// Test data creation helpers

pub async fn create_test_exercise(pool: &DbPool, created_by: &str, name: &str, group: &str) -> Exercise {
    let exercise_repo = ExerciseRepository::new(pool.clone());
    let input = ExerciseInput {
        name: name.to_string(),
        muscle_group: group.to_string(),
        equipment: None,
        video_url: None,
        image_url: None,
        instructions: None,
        tags: vec![],
    };
    exercise_repo.create(input, created_by).await.unwrap()
}

pub async fn create_test_workout(
    pool: &DbPool,
    created_by: &str,
    title: &str,
    difficulty: Difficulty,
) -> Workout {
    let workout_repo = WorkoutRepository::new(pool.clone());
    let input = WorkoutInput {
        title: title.to_string(),
        description: None,
        difficulty,
        days_per_week: 3,
        duration_weeks: None,
    };
    workout_repo.create(input, created_by).await.unwrap()
}

pub async fn create_test_day(pool: &DbPool, workout_id: &str, day_number: i32, name: &str) -> WorkoutDay {
    let workout_repo = WorkoutRepository::new(pool.clone());
    let input = WorkoutDayInput {
        day_number,
        name: name.to_string(),
        notes: None,
    };
    workout_repo.add_day(workout_id, input).await.unwrap()
}

pub async fn add_test_day_exercise(
    pool: &DbPool,
    day_id: &str,
    exercise_id: &str,
    sets: i32,
) -> WorkoutExercise {
    let workout_repo = WorkoutRepository::new(pool.clone());
    let input = WorkoutExerciseInput {
        exercise_id: exercise_id.to_string(),
        sets,
        reps: "8-12".to_string(),
        rest_seconds: Some(90),
        notes: None,
        order_index: None,
    };
    workout_repo.add_exercise(day_id, input).await.unwrap()
}

/// A plan with one day ("Push", Monday) holding bench press and overhead press.
pub struct TestPlan {
    pub workout: Workout,
    pub day: WorkoutDay,
    pub entries: Vec<WorkoutExercise>,
}

pub async fn create_test_plan(pool: &DbPool, created_by: &str, difficulty: Difficulty) -> TestPlan {
    let bench = create_test_exercise(pool, created_by, "Bench Press", "chest").await;
    let press = create_test_exercise(pool, created_by, "Overhead Press", "shoulders").await;
    let workout = create_test_workout(pool, created_by, "Push Pull Legs", difficulty).await;
    let day = create_test_day(pool, &workout.id, 1, "Push").await;
    let entries = vec![
        add_test_day_exercise(pool, &day.id, &bench.id, 4).await,
        add_test_day_exercise(pool, &day.id, &press.id, 3).await,
    ];
    TestPlan {
        workout,
        day,
        entries,
    }
}
