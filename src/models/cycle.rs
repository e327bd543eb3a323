use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Active,
    Closed,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Active => "active",
            CycleStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionCycle {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: CycleStatus,
    pub created_at: DateTime<Utc>,
}

impl SubmissionCycle {
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }

    /// Status as seen at `today`; an active cycle past its end date reads as closed.
    pub fn effective_status(&self, today: NaiveDate) -> CycleStatus {
        if self.status == CycleStatus::Active && !self.has_ended(today) {
            CycleStatus::Active
        } else {
            CycleStatus::Closed
        }
    }

    pub fn accepts_submissions(&self, today: NaiveDate) -> bool {
        self.status == CycleStatus::Active && self.start_date <= today && today <= self.end_date
    }

    /// Approved reports may be finalized once the cycle is over.
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == CycleStatus::Closed
    }
}
