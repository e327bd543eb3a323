use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::company::{CompanyDecision, CompanySize};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCompanyPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub industry: String,
    pub size: CompanySize,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCompanyPayload {
    pub decision: CompanyDecision,
    pub note: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistPayload {
    pub blacklisted: bool,
    pub reason: Option<String>,
    pub expected_version: Option<u64>,
}
