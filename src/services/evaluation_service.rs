use serde_json::Number;
use uuid::Uuid;

use crate::dto::evaluation_dto::EvaluationPayload;
use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Role},
    application::ApplicationStatus,
    entity::EntityType,
    evaluation::Evaluation,
};
use crate::services::{
    audit_service::AuditService,
    authorization::{self, Operation, Rule, Scoped},
};
use crate::store::{EntityStore, Versioned};
use crate::utils::time::SharedClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Fails with `DuplicateEvaluation` if one already exists.
    Create,
    Update,
}

#[derive(Clone)]
pub struct EvaluationService {
    store: EntityStore,
    clock: SharedClock,
    audit: AuditService,
}

/// Accepts whole numbers 1 to 5; anything else is `InvalidRating`.
pub fn parse_rating(rating: Option<&Number>) -> Result<u8> {
    let Some(rating) = rating else {
        return Err(Error::InvalidRating(None));
    };
    match rating.as_i64() {
        Some(value @ 1..=5) => Ok(value as u8),
        Some(value) => Err(Error::InvalidRating(Some(value))),
        None => Err(Error::InvalidRating(None)),
    }
}

fn ensure_author(actor: &Actor, company_id: Uuid) -> Result<()> {
    if actor.role == Role::Company && actor.id == company_id {
        return Ok(());
    }
    tracing::warn!(actor = %actor, "evaluation change by non-authoring actor refused");
    Err(Error::forbidden(Rule::AuthoringCompanyOnly))
}

impl EvaluationService {
    pub fn new(store: EntityStore, clock: SharedClock, audit: AuditService) -> Self {
        Self { store, clock, audit }
    }

    pub async fn create_or_update(
        &self,
        actor: &Actor,
        application_id: Uuid,
        payload: EvaluationPayload,
        mode: EvaluationMode,
    ) -> Result<Versioned<Evaluation>> {
        match mode {
            EvaluationMode::Create => self.create(actor, application_id, payload).await,
            EvaluationMode::Update => self.update(actor, application_id, payload).await,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        application_id: Uuid,
        payload: EvaluationPayload,
    ) -> Result<Versioned<Evaluation>> {
        authorization::authorize_role(actor, Operation::WriteEvaluation)?;

        // Holding the application lock serializes evaluation creation for it.
        let entry = self.store.applications.lock(application_id).await?;
        let application = entry.current().record;
        ensure_author(actor, application.company_id)?;

        if application.status != ApplicationStatus::Completed {
            return Err(Error::InvalidTransition {
                from: application.status.to_string(),
                action: "evaluate".to_string(),
                allowed: Vec::new(),
                reason: Some("only completed internships can be evaluated".to_string()),
            });
        }
        if self.store.evaluation_for_application(application.id).is_some() {
            return Err(Error::DuplicateEvaluation(application.id));
        }
        let rating = parse_rating(payload.rating.as_ref())?;

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            application_id: application.id,
            company_id: application.company_id,
            student_id: application.student_id,
            student_name: application.student_name.clone(),
            job_title: application.job_title.clone(),
            rating,
            comments: payload.comments.trim().to_string(),
            submitted_date: self.clock.now(),
            updated_at: None,
        };
        let created = self.store.evaluations.insert(evaluation)?;
        drop(entry);

        tracing::info!(evaluation_id = %created.record.id, application_id = %application.id, rating, "evaluation submitted");
        Ok(created)
    }

    /// Edits rating and comments. `submitted_date` keeps the creation time.
    pub async fn update(
        &self,
        actor: &Actor,
        application_id: Uuid,
        payload: EvaluationPayload,
    ) -> Result<Versioned<Evaluation>> {
        authorization::authorize_role(actor, Operation::WriteEvaluation)?;
        let existing = self.find(application_id)?;

        let entry = self.store.evaluations.lock(existing.record.id).await?;
        let mut evaluation = entry.current().record;
        ensure_author(actor, evaluation.company_id)?;
        entry.check_version(payload.expected_version)?;
        let rating = parse_rating(payload.rating.as_ref())?;

        evaluation.rating = rating;
        evaluation.comments = payload.comments.trim().to_string();
        evaluation.updated_at = Some(self.clock.now());
        let committed = entry.commit(evaluation);

        tracing::info!(evaluation_id = %committed.record.id, rating, "evaluation updated");
        Ok(committed)
    }

    /// Removes the evaluation outright; its content is kept in the audit log.
    pub async fn delete(&self, actor: &Actor, application_id: Uuid) -> Result<Evaluation> {
        authorization::authorize_role(actor, Operation::WriteEvaluation)?;
        let existing = self.find(application_id)?;

        let entry = self.store.evaluations.lock(existing.record.id).await?;
        let current = entry.current().record;
        ensure_author(actor, current.company_id)?;
        let snapshot = serde_json::to_value(&current)?;
        let removed = entry.remove();

        self.audit.log(
            actor,
            "delete_evaluation",
            EntityType::Evaluation,
            removed.id,
            Some(snapshot),
        );
        tracing::info!(evaluation_id = %removed.id, application_id = %application_id, "evaluation deleted");
        Ok(removed)
    }

    pub fn get(&self, actor: &Actor, application_id: Uuid) -> Result<Versioned<Evaluation>> {
        let evaluation = self.find(application_id)?;
        authorization::authorize(actor, Operation::Read, &evaluation.record.scope())?;
        Ok(evaluation)
    }

    fn find(&self, application_id: Uuid) -> Result<Versioned<Evaluation>> {
        self.store
            .evaluation_for_application(application_id)
            .ok_or_else(|| {
                Error::NotFound(format!("evaluation for application {} not found", application_id))
            })
    }
}
