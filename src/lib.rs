pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService, audit_service::AuditService,
    company_service::CompanyService, cycle_service::CycleService,
    evaluation_service::EvaluationService, job_service::JobService,
    notification_service::NotificationService, query_service::QueryService,
    submission_service::SubmissionService,
};
use crate::store::EntityStore;
use crate::utils::time::{SharedClock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: SharedClock,
    pub store: EntityStore,
    pub audit_service: AuditService,
    pub notification_service: NotificationService,
    pub submission_service: SubmissionService,
    pub application_service: ApplicationService,
    pub evaluation_service: EvaluationService,
    pub company_service: CompanyService,
    pub job_service: JobService,
    pub cycle_service: CycleService,
    pub query_service: QueryService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: SharedClock) -> Self {
        let store = EntityStore::new(config.lock_timeout);
        let audit_service = AuditService::new(clock.clone());
        let notification_service = NotificationService::new(&config, clock.clone());

        let submission_service = SubmissionService::new(
            store.clone(),
            clock.clone(),
            notification_service.clone(),
            audit_service.clone(),
        );
        let application_service =
            ApplicationService::new(store.clone(), clock.clone(), notification_service.clone());
        let evaluation_service =
            EvaluationService::new(store.clone(), clock.clone(), audit_service.clone());
        let company_service = CompanyService::new(
            store.clone(),
            clock.clone(),
            notification_service.clone(),
            audit_service.clone(),
        );
        let job_service = JobService::new(store.clone(), clock.clone());
        let cycle_service = CycleService::new(store.clone(), clock.clone(), audit_service.clone());
        let query_service = QueryService::new(store.clone(), clock.clone());

        Self {
            config: Arc::new(config),
            clock,
            store,
            audit_service,
            notification_service,
            submission_service,
            application_service,
            evaluation_service,
            company_service,
            job_service,
            cycle_service,
            query_service,
        }
    }
}
