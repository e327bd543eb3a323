use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

use crate::models::application::ApplicationAction;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub job_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub student_name: String,
    #[validate(length(min = 1, max = 2048))]
    pub resume_url: String,
    pub cover_letter_url: Option<String>,
    #[serde(default)]
    pub additional_docs: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionApplicationPayload {
    pub action: ApplicationAction,
    #[validate(length(max = 4000))]
    pub note: Option<String>,
    pub expected_version: Option<u64>,
    /// Complete the internship before its job window has elapsed.
    #[serde(default)]
    pub explicit: bool,
}

impl TransitionApplicationPayload {
    pub fn new(action: ApplicationAction) -> Self {
        Self {
            action,
            note: None,
            expected_version: None,
            explicit: false,
        }
    }
}
