use uuid::Uuid;

use crate::dto::job_dto::CreateJobPayload;
use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Role},
    company::CompanyStatus,
    job::Job,
};
use crate::services::authorization::{self, Operation, Rule, Scoped};
use crate::store::{EntityStore, Versioned};
use crate::utils::time::SharedClock;

#[derive(Clone)]
pub struct JobService {
    store: EntityStore,
    clock: SharedClock,
}

/// Students and faculty only see listings of approved, non-blacklisted companies.
pub fn job_visible(store: &EntityStore, actor: &Actor, job: &Job) -> bool {
    match actor.role {
        Role::Scad => true,
        Role::Company => actor.id == job.company_id,
        Role::Student | Role::Faculty => store
            .companies
            .find(job.company_id)
            .map_or(false, |c| c.record.is_listed()),
    }
}

impl JobService {
    pub fn new(store: EntityStore, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub fn create(&self, actor: &Actor, payload: CreateJobPayload) -> Result<Versioned<Job>> {
        authorization::authorize_role(actor, Operation::PostJob)?;

        let company = self
            .store
            .companies
            .find(actor.id)
            .map(|c| c.record)
            .filter(|c| c.status == CompanyStatus::Approved)
            .ok_or_else(|| Error::forbidden(Rule::CompanyNotApproved))?;
        if company.blacklisted {
            return Err(Error::CompanyBlacklisted(company.id));
        }

        let job = Job {
            id: Uuid::new_v4(),
            company_id: company.id,
            company_name: company.name.clone(),
            title: payload.title.trim().to_string(),
            description: payload.description,
            duration_weeks: payload.duration_weeks,
            paid: payload.paid,
            salary: if payload.paid { payload.salary } else { None },
            skills: payload
                .skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            created_at: self.clock.now(),
        };
        let created = self.store.jobs.insert(job)?;
        tracing::info!(job_id = %created.record.id, company_id = %company.id, "job posted");
        Ok(created)
    }

    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<Versioned<Job>> {
        let job = self.store.jobs.get(id)?;
        authorization::authorize(actor, Operation::Read, &job.record.scope())?;
        if !job_visible(&self.store, actor, &job.record) {
            // Hidden listings read as absent rather than forbidden.
            return Err(Error::NotFound(format!("job {} not found", id)));
        }
        Ok(job)
    }
}
