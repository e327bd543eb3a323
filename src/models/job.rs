use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An internship listing posted by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub duration_weeks: u32,
    pub paid: bool,
    pub salary: Option<Decimal>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn duration(&self) -> Duration {
        Duration::weeks(i64::from(self.duration_weeks))
    }

    /// Whether an internship started at `started_at` has run its full course by `now`.
    pub fn window_elapsed(&self, started_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        started_at + self.duration() <= now
    }
}
