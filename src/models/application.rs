use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::timeline::TimelineEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Finalized,
    Accepted,
    Rejected,
    Current,
    Completed,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Finalized => "finalized",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Current => "current",
            ApplicationStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Completed)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationAction {
    Finalize,
    Accept,
    Reject,
    #[serde(alias = "markCurrent")]
    MarkCurrent,
    #[serde(alias = "markCompleted")]
    MarkCompleted,
}

impl ApplicationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationAction::Finalize => "finalize",
            ApplicationAction::Accept => "accept",
            ApplicationAction::Reject => "reject",
            ApplicationAction::MarkCurrent => "mark_current",
            ApplicationAction::MarkCompleted => "mark_completed",
        }
    }
}

impl fmt::Display for ApplicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ApplicationTimelineEntry = TimelineEntry<ApplicationStatus, ApplicationAction>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub applied_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub resume_url: String,
    pub cover_letter_url: Option<String>,
    pub additional_docs: BTreeSet<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub timeline: Vec<ApplicationTimelineEntry>,
}
