use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_salary"))]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 1, max = 104))]
    pub duration_weeks: u32,
    #[serde(default)]
    pub paid: bool,
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn validate_salary(job: &CreateJobPayload) -> Result<(), ValidationError> {
    match (job.paid, job.salary) {
        (true, None) => Err(ValidationError::new("salary_required_when_paid")),
        (_, Some(salary)) if salary.is_sign_negative() => {
            Err(ValidationError::new("salary_negative"))
        }
        _ => Ok(()),
    }
}
