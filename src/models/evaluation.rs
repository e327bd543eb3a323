use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A company's evaluation of a completed internship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub application_id: Uuid,
    pub company_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub job_title: String,
    pub rating: u8,
    pub comments: String,
    pub submitted_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
