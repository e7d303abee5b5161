use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_sessions: i64,
    pub sessions_this_week: i64,
    pub sessions_this_month: i64,
    pub total_calories: i64,
    pub total_minutes: i64,
    pub average_feeling: Option<f64>,
    pub completed_assignments: i64,
}
