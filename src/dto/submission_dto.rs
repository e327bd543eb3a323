use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::submission::{CompanyInfo, DocumentKind, SubmissionAction};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentPayload {
    pub kind: DocumentKind,
    /// Handle returned by the document store.
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_internship_dates"))]
pub struct CompanyInfoPayload {
    #[validate(length(min = 1, max = 200))]
    pub company_name: String,
    pub company_address: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub supervisor_name: String,
    #[validate(email)]
    pub supervisor_email: String,
    pub position_title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate_internship_dates(info: &CompanyInfoPayload) -> Result<(), ValidationError> {
    match (info.start_date, info.end_date) {
        (Some(start), Some(end)) if start > end => Err(ValidationError::new("end_before_start")),
        _ => Ok(()),
    }
}

impl From<CompanyInfoPayload> for CompanyInfo {
    fn from(value: CompanyInfoPayload) -> Self {
        Self {
            company_name: value.company_name.trim().to_string(),
            company_address: value.company_address,
            supervisor_name: value.supervisor_name.trim().to_string(),
            supervisor_email: value.supervisor_email.trim().to_string(),
            position_title: value.position_title,
            start_date: value.start_date,
            end_date: value.end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubmissionPayload {
    pub cycle_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub student_name: String,
    /// Registered company profile, when the internship was found through the portal.
    pub company_id: Option<Uuid>,
    #[validate(nested)]
    pub company: CompanyInfoPayload,
    #[serde(default)]
    #[validate(nested)]
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionSubmissionPayload {
    pub action: SubmissionAction,
    #[validate(length(max = 4000))]
    pub note: Option<String>,
    /// New documents; required when resubmitting.
    #[serde(default)]
    #[validate(nested)]
    pub documents: Vec<DocumentPayload>,
    pub expected_version: Option<u64>,
    /// Finalize before the cycle has closed.
    #[serde(default)]
    pub explicit: bool,
}

impl TransitionSubmissionPayload {
    pub fn new(action: SubmissionAction) -> Self {
        Self {
            action,
            note: None,
            documents: Vec::new(),
            expected_version: None,
            explicit: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignFacultyPayload {
    pub faculty_id: Uuid,
    pub expected_version: Option<u64>,
}
