use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Approved,
    Rejected,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Pending => "pending",
            CompanyStatus::Approved => "approved",
            CompanyStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SCAD's decision on a company registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyDecision {
    Approve,
    Reject,
}

impl fmt::Display for CompanyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanyDecision::Approve => f.write_str("approve"),
            CompanyDecision::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    /// 50 employees or less
    Small,
    /// 51-100 employees
    Medium,
    /// 101-500 employees
    Large,
    /// 500+ employees
    Corporate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub industry: String,
    pub size: CompanySize,
    pub email: String,
    pub description: Option<String>,
    pub status: CompanyStatus,
    pub blacklisted: bool,
    pub blacklist_reason: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Company {
    /// Visible to students and faculty in the public directory.
    pub fn is_listed(&self) -> bool {
        self.status == CompanyStatus::Approved && !self.blacklisted
    }
}
