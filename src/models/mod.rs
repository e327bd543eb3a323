pub mod actor;
pub mod application;
pub mod audit_log;
pub mod company;
pub mod cycle;
pub mod entity;
pub mod evaluation;
pub mod event;
pub mod job;
pub mod notification;
pub mod submission;
pub mod timeline;
