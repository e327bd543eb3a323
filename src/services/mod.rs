pub mod application_service;
pub mod audit_service;
pub mod authorization;
pub mod company_service;
pub mod cycle_service;
pub mod evaluation_service;
pub mod export_service;
pub mod job_service;
pub mod notification_service;
pub mod query_service;
pub mod submission_service;
pub mod transition;
