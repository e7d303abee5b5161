use axum::{extract::State, Json};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::StatsSummary;
use crate::repositories::TrainingRepository;

#[derive(Clone)]
pub struct StatsState {
    pub training_repo: TrainingRepository,
}

pub async fn summary(
    State(state): State<StatsState>,
    auth_user: AuthUser,
) -> Result<Json<StatsSummary>> {
    let today = Utc::now().date_naive();
    let (week_start, month_start) = period_starts(today);

    let summary = state
        .training_repo
        .summary(&auth_user.id, week_start, month_start)
        .await?;
    Ok(Json(summary))
}

/// Midnight UTC of the Monday of `today`'s week and of the first of its month.
fn period_starts(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let first = today.with_day(1).unwrap_or(today);
    (
        monday.and_time(NaiveTime::MIN).and_utc(),
        first.and_time(NaiveTime::MIN).and_utc(),
    )
}
