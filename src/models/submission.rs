use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::timeline::TimelineEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Flagged,
    Rejected,
    Approved,
    Completed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Flagged => "flagged",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Rejected | SubmissionStatus::Completed)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionAction {
    Approve,
    Reject,
    Flag,
    Resubmit,
    Finalize,
}

impl SubmissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionAction::Approve => "approve",
            SubmissionAction::Reject => "reject",
            SubmissionAction::Flag => "flag",
            SubmissionAction::Resubmit => "resubmit",
            SubmissionAction::Finalize => "finalize",
        }
    }

    /// Review decisions taken by the assigned faculty member.
    pub fn is_review(&self) -> bool {
        matches!(
            self,
            SubmissionAction::Approve | SubmissionAction::Reject | SubmissionAction::Flag
        )
    }
}

impl fmt::Display for SubmissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    EvaluationForm,
    CoverLetter,
    Other,
}

/// An opaque handle returned by the document-storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: DocumentKind,
    pub url: String,
    pub name: Option<String>,
    pub attached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    pub company_address: Option<String>,
    pub supervisor_name: String,
    pub supervisor_email: String,
    pub position_title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub type SubmissionTimelineEntry = TimelineEntry<SubmissionStatus, SubmissionAction>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub cycle_id: Uuid,
    pub company_id: Option<Uuid>,
    pub company: CompanyInfo,
    pub faculty_assigned: Option<Uuid>,
    pub status: SubmissionStatus,
    pub submission_date: DateTime<Utc>,
    pub documents: Vec<Document>,
    pub timeline: Vec<SubmissionTimelineEntry>,
    pub feedback: Option<String>,
}

impl Submission {
    pub fn has_evaluation_form(&self) -> bool {
        self.documents
            .iter()
            .any(|d| d.kind == DocumentKind::EvaluationForm)
    }
}
