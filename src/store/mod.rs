//! In-memory entity store.
//!
//! One [`Table`] per entity type. All status changes go through
//! [`Table::lock`] so that concurrent writers on one id are serialized and a
//! stale writer gets `ConcurrentModification` instead of overwriting.

pub mod table;

use std::time::Duration;
use uuid::Uuid;

pub use table::{Entry, Record, Table, Versioned};

use crate::models::{
    application::Application, company::Company, cycle::SubmissionCycle, entity::EntityType,
    evaluation::Evaluation, job::Job, submission::Submission,
};

#[derive(Clone)]
pub struct EntityStore {
    pub submissions: Table<Submission>,
    pub applications: Table<Application>,
    pub companies: Table<Company>,
    pub jobs: Table<Job>,
    pub evaluations: Table<Evaluation>,
    pub cycles: Table<SubmissionCycle>,
}

impl EntityStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            submissions: Table::new(lock_timeout),
            applications: Table::new(lock_timeout),
            companies: Table::new(lock_timeout),
            jobs: Table::new(lock_timeout),
            evaluations: Table::new(lock_timeout),
            cycles: Table::new(lock_timeout),
        }
    }

    pub fn evaluation_for_application(&self, application_id: Uuid) -> Option<Versioned<Evaluation>> {
        self.evaluations
            .all()
            .into_iter()
            .find(|e| e.record.application_id == application_id)
    }
}

impl Record for Submission {
    const KIND: EntityType = EntityType::Submission;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Application {
    const KIND: EntityType = EntityType::Application;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Company {
    const KIND: EntityType = EntityType::Company;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Job {
    const KIND: EntityType = EntityType::Job;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Evaluation {
    const KIND: EntityType = EntityType::Evaluation;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for SubmissionCycle {
    const KIND: EntityType = EntityType::Cycle;

    fn id(&self) -> Uuid {
        self.id
    }
}
