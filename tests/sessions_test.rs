mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use fittrack::db::DbPool;
use fittrack::models::{Difficulty, UserRole};
use serde_json::{json, Value};

/// Pretend the session was started `minutes` ago.
fn backdate_session(pool: &DbPool, session_id: &str, minutes: i64) {
    let conn = pool.get().unwrap();
    conn.execute(
        "UPDATE workout_sessions SET started_at = ? WHERE id = ?",
        rusqlite::params![Utc::now() - Duration::minutes(minutes), session_id],
    )
    .unwrap();
}

async fn start_session(app: &axum::Router, cookie: &str, day_id: &str) -> (StatusCode, Value) {
    common::send(
        app,
        Method::POST,
        "/api/sessions",
        Some(cookie),
        Some(json!({"day_id": day_id})),
    )
    .await
}

#[tokio::test]
async fn test_start_creates_then_resumes() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (status, first) = start_session(&app, &cookie, &plan.day.id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "in_progress");
    assert_eq!(first["user_id"], user.id.as_str());
    assert_eq!(first["workout_id"], plan.workout.id.as_str());

    let (status, second) = start_session(&app, &cookie, &plan.day.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);

    let (status, _) = start_session(&app, &cookie, "missing-day").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_complete_exercise_is_idempotent() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    let uri = format!("/api/sessions/{}/exercises/{}", session_id, plan.entries[0].id);

    let (status, log) = common::send(
        &app,
        Method::POST,
        &uri,
        Some(&cookie),
        Some(json!({"reps": 10, "weight_kg": 60.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // Planned sets are used when none are given
    assert_eq!(log["sets_completed"], 4);
    assert_eq!(log["exercise_name"], "Bench Press");
    assert_eq!(log["weight_kg"], 60.0);

    let (status, again) = common::send(
        &app,
        Method::POST,
        &uri,
        Some(&cookie),
        Some(json!({"sets_completed": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], log["id"]);
    assert_eq!(again["sets_completed"], 4);

    let (_, detail) = common::send(
        &app,
        Method::GET,
        &format!("/api/sessions/{}", session_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(detail["logs"].as_array().unwrap().len(), 1);
    assert_eq!(detail["workout_title"], "Push Pull Legs");
    assert_eq!(detail["day_name"], "Push");
}

#[tokio::test]
async fn test_complete_rejects_exercise_from_another_day() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let legs = common::create_test_day(&pool, &plan.workout.id, 5, "Legs").await;
    let squat = common::create_test_exercise(&pool, &admin.id, "Back Squat", "legs").await;
    let squat_entry = common::add_test_day_exercise(&pool, &legs.id, &squat.id, 5).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let (status, _) = common::send(
        &app,
        Method::POST,
        &format!(
            "/api/sessions/{}/exercises/{}",
            session["id"].as_str().unwrap(),
            squat_entry.id
        ),
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_reconciles_logs_with_plan() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    let progress_uri = format!("/api/sessions/{}/progress", session_id);

    let (status, progress) = common::send(&app, Method::GET, &progress_uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["total"], 2);
    assert_eq!(progress["completed"], 0);
    assert_eq!(progress["is_complete"], false);

    for entry in &plan.entries {
        let (status, _) = common::send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/exercises/{}", session_id, entry.id),
            Some(&cookie),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, progress) = common::send(&app, Method::GET, &progress_uri, Some(&cookie), None).await;
    assert_eq!(progress["completed"], 2);
    assert_eq!(progress["is_complete"], true);
    assert!(progress["remaining_ids"].as_array().unwrap().is_empty());

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/api/sessions/{}/exercises/{}", session_id, plan.entries[1].id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, progress) = common::send(&app, Method::GET, &progress_uri, Some(&cookie), None).await;
    assert_eq!(progress["completed"], 1);
    assert_eq!(progress["remaining_ids"], json!([plan.entries[1].id]));
    assert_eq!(progress["is_complete"], false);
}

#[tokio::test]
async fn test_sessions_of_other_users_are_hidden() {
    let pool = common::setup_test_db();
    let (admin, admin_cookie) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();

    for uri in [
        format!("/api/sessions/{}", session_id),
        format!("/api/sessions/{}/progress", session_id),
    ] {
        let (status, _) = common::send(&app, Method::GET, &uri, Some(&admin_cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/api/sessions/{}", session_id),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_finish_estimates_calories_with_default_weight() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool.clone());

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    backdate_session(&pool, session_id, 60);

    let finish_uri = format!("/api/sessions/{}/finish", session_id);
    let (status, finished) = common::send(
        &app,
        Method::POST,
        &finish_uri,
        Some(&cookie),
        Some(json!({"feeling": 4, "notes": "Felt strong"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["feeling"], 4);
    assert_eq!(finished["notes"], "Felt strong");
    assert!(finished["ended_at"].is_string());

    let duration = finished["duration_seconds"].as_i64().unwrap();
    assert!((3600..3660).contains(&duration));
    // 3.5 MET x 70 kg x 1 h
    assert_eq!(finished["calories"], 245);

    let (status, _) = common::send(&app, Method::POST, &finish_uri, Some(&cookie), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Finished sessions no longer accept exercises
    let (status, _) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/exercises/{}", session_id, plan.entries[0].id),
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_finish_uses_profile_weight() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Intermediate).await;
    let app = common::create_test_app(pool.clone());

    let (status, _) = common::send(
        &app,
        Method::PUT,
        "/api/profile",
        Some(&cookie),
        Some(json!({"weight_kg": 80.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    backdate_session(&pool, session_id, 30);

    let (status, finished) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", session_id),
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 5.0 MET x 80 kg x 0.5 h
    assert_eq!(finished["calories"], 200);
    assert!(finished["feeling"].is_null());
}

#[tokio::test]
async fn test_finish_rejects_out_of_range_feeling() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let (status, _) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", session["id"].as_str().unwrap()),
        Some(&cookie),
        Some(json!({"feeling": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_abandons_session() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/exercises/{}", session_id, plan.entries[0].id),
        Some(&cookie),
        Some(json!({})),
    )
    .await;

    let uri = format!("/api/sessions/{}", session_id);
    let (status, _) = common::send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::send(&app, Method::GET, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A fresh start opens a new session
    let (status, fresh) = start_session(&app, &cookie, &plan.day.id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(fresh["id"], session["id"]);
}

#[tokio::test]
async fn test_history_is_paginated_newest_first() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool.clone());

    let mut ids = Vec::new();
    for i in 0..12 {
        let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
        let id = session["id"].as_str().unwrap().to_string();
        backdate_session(&pool, &id, 24 * 60 - i);
        let (status, _) = common::send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/finish", id),
            Some(&cookie),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(id);
    }

    let (status, page1) = common::send(&app, Method::GET, "/api/sessions", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page1["page"], 1);
    assert_eq!(page1["total_pages"], 2);
    assert_eq!(page1["sessions"].as_array().unwrap().len(), 10);
    assert_eq!(page1["sessions"][0]["id"], ids[11].as_str());

    let (_, page2) = common::send(&app, Method::GET, "/api/sessions?page=2", Some(&cookie), None).await;
    assert_eq!(page2["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(page2["sessions"][1]["id"], ids[0].as_str());
}

#[tokio::test]
async fn test_start_promotes_assignment() {
    let pool = common::setup_test_db();
    let (admin, admin_cookie) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (status, assignment) = common::send(
        &app,
        Method::POST,
        "/api/assignments",
        Some(&admin_cookie),
        Some(json!({"user_id": user.id, "workout_id": plan.workout.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assignment["status"], "assigned");

    start_session(&app, &cookie, &plan.day.id).await;

    let (_, mine) = common::send(&app, Method::GET, "/api/assignments", Some(&cookie), None).await;
    assert_eq!(mine[0]["id"], assignment["id"]);
    assert_eq!(mine[0]["status"], "in_progress");
}

#[tokio::test]
async fn test_stats_summary() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool.clone());

    let (_, empty) = common::send(&app, Method::GET, "/api/stats", Some(&cookie), None).await;
    assert_eq!(empty["total_sessions"], 0);
    assert!(empty["average_feeling"].is_null());

    for feeling in [3, 5] {
        let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
        let id = session["id"].as_str().unwrap();
        backdate_session(&pool, id, 60);
        common::send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/finish", id),
            Some(&cookie),
            Some(json!({"feeling": feeling})),
        )
        .await;
    }
    // Open sessions do not count
    start_session(&app, &cookie, &plan.day.id).await;

    let (status, stats) = common::send(&app, Method::GET, "/api/stats", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["total_calories"], 490);
    assert_eq!(stats["total_minutes"], 120);
    assert_eq!(stats["average_feeling"], 4.0);
    assert_eq!(stats["completed_assignments"], 0);
}

#[tokio::test]
async fn test_plan_edits_keep_session_history() {
    let pool = common::setup_test_db();
    let (admin, admin_cookie) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let session_id = session["id"].as_str().unwrap();
    for entry in &plan.entries {
        common::send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/exercises/{}", session_id, entry.id),
            Some(&cookie),
            Some(json!({})),
        )
        .await;
    }
    let (status, _) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", session_id),
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let removed = &plan.entries[0];
    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!(
            "/api/workouts/{}/days/{}/exercises/{}",
            plan.workout.id, plan.day.id, removed.id
        ),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, detail) = common::send(
        &app,
        Method::GET,
        &format!("/api/sessions/{}", session_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = detail["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    let orphan = logs
        .iter()
        .find(|log| log["exercise_id"] == removed.exercise_id.as_str())
        .unwrap();
    assert!(orphan["workout_exercise_id"].is_null());
    assert_eq!(orphan["exercise_name"], "Bench Press");

    // Progress only counts what is still planned
    let (_, progress) = common::send(
        &app,
        Method::GET,
        &format!("/api/sessions/{}/progress", session_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(progress["total"], 1);
    assert_eq!(progress["is_complete"], true);

    // The exercise is out of every plan but still in history
    let (status, _) = common::send(
        &app,
        Method::DELETE,
        &format!("/api/exercises/{}", removed.exercise_id),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_history_page_out_of_range_is_clamped() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (status, empty) =
        common::send(&app, Method::GET, "/api/sessions?page=9223372036854775807", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["page"], 1);
    assert_eq!(empty["total_pages"], 0);
    assert!(empty["sessions"].as_array().unwrap().is_empty());

    start_session(&app, &cookie, &plan.day.id).await;

    for uri in [
        "/api/sessions?page=9223372036854775807",
        "/api/sessions?page=-9223372036854775808",
    ] {
        let (status, body) = common::send(&app, Method::GET, uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_concurrent_completions_share_one_log() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool);

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let uri = format!(
        "/api/sessions/{}/exercises/{}",
        session["id"].as_str().unwrap(),
        plan.entries[0].id
    );

    let (first, second) = tokio::join!(
        common::send(&app, Method::POST, &uri, Some(&cookie), Some(json!({}))),
        common::send(&app, Method::POST, &uri, Some(&cookie), Some(json!({}))),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CREATED]);
    assert_eq!(first.1["id"], second.1["id"]);
}

#[tokio::test]
async fn test_stats_week_and_month_exclude_older_sessions() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool.clone());

    // One session 40 days ago, one just now
    for minutes_ago in [40 * 24 * 60, 1] {
        let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
        let id = session["id"].as_str().unwrap();
        backdate_session(&pool, id, minutes_ago);
        let (status, _) = common::send(
            &app,
            Method::POST,
            &format!("/api/sessions/{}/finish", id),
            Some(&cookie),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, stats) = common::send(&app, Method::GET, "/api/stats", Some(&cookie), None).await;
    assert_eq!(stats["total_sessions"], 2);
    assert_eq!(stats["sessions_this_week"], 1);
    assert_eq!(stats["sessions_this_month"], 1);
}

#[tokio::test]
async fn test_forgotten_session_still_uses_full_duration() {
    let pool = common::setup_test_db();
    let (admin, _) = common::login_as(&pool, "admin@example.com", UserRole::Admin).await;
    let (_user, cookie) = common::login_as(&pool, "member@example.com", UserRole::User).await;
    let plan = common::create_test_plan(&pool, &admin.id, Difficulty::Beginner).await;
    let app = common::create_test_app(pool.clone());

    let (_, session) = start_session(&app, &cookie, &plan.day.id).await;
    let id = session["id"].as_str().unwrap();
    backdate_session(&pool, id, 20 * 60);

    let (status, finished) = common::send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", id),
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(finished["duration_seconds"].as_i64().unwrap() >= 20 * 3600);
    // 3.5 MET x 70 kg x 20 h
    assert_eq!(finished["calories"], 4900);
}
