use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Recipient;
use super::entity::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SubmissionCreated,
    SubmissionAssigned,
    SubmissionApproved,
    SubmissionRejected,
    SubmissionFlagged,
    SubmissionResubmitted,
    SubmissionCompleted,
    ApplicationReceived,
    ApplicationFinalized,
    ApplicationAccepted,
    ApplicationRejected,
    InternshipStarted,
    InternshipCompleted,
    EvaluationRequested,
    CompanyRegistered,
    CompanyApproved,
    CompanyRejected,
    CompanyBlacklisted,
    CompanyReinstated,
}

/// A structured notification handed to the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub recipient: Recipient,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub message: String,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(
        kind: EventKind,
        recipient: Recipient,
        entity_type: EntityType,
        entity_id: Uuid,
        message: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            recipient,
            entity_type,
            entity_id,
            message: message.into(),
            note: None,
            occurred_at,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
