pub mod application_dto;
pub mod company_dto;
pub mod cycle_dto;
pub mod evaluation_dto;
pub mod job_dto;
pub mod list_dto;
pub mod submission_dto;
