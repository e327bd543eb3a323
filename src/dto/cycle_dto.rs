use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
pub struct CreateCyclePayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Open the cycle right away, closing whichever cycle is active.
    #[serde(default)]
    pub activate: bool,
}

fn validate_window(cycle: &CreateCyclePayload) -> Result<(), ValidationError> {
    if cycle.start_date > cycle.end_date {
        return Err(ValidationError::new("end_before_start"));
    }
    Ok(())
}
