use uuid::Uuid;

use crate::dto::application_dto::{CreateApplicationPayload, TransitionApplicationPayload};
use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Recipient},
    application::{Application, ApplicationAction, ApplicationStatus, ApplicationTimelineEntry},
    entity::EntityType,
    event::{DomainEvent, EventKind},
};
use crate::services::{
    authorization::{self, Operation, Rule, Scoped},
    notification_service::NotificationService,
    transition::{self, APPLICATION_TRANSITIONS},
};
use crate::store::{EntityStore, Versioned};
use crate::utils::time::SharedClock;

/// Outcome of applying to a job.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Created(Versioned<Application>),
    /// The student had already applied; nothing was written.
    Existing(Versioned<Application>),
}

impl Applied {
    pub fn is_new(&self) -> bool {
        matches!(self, Applied::Created(_))
    }

    pub fn into_inner(self) -> Versioned<Application> {
        match self {
            Applied::Created(a) | Applied::Existing(a) => a,
        }
    }
}

#[derive(Clone)]
pub struct ApplicationService {
    store: EntityStore,
    clock: SharedClock,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(store: EntityStore, clock: SharedClock, notifications: NotificationService) -> Self {
        Self {
            store,
            clock,
            notifications,
        }
    }

    /// Applies to a job listing. Applying twice to the same job returns the
    /// existing application.
    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateApplicationPayload,
    ) -> Result<Applied> {
        authorization::authorize_role(actor, Operation::CreateApplication)?;

        // Serializes applications against one listing.
        let job_entry = self.store.jobs.lock(payload.job_id).await?;
        let job = job_entry.current().record;
        let company = self.store.companies.get(job.company_id)?.record;
        if company.blacklisted {
            tracing::warn!(job_id = %job.id, company_id = %company.id, "application to blacklisted company refused");
            return Err(Error::CompanyBlacklisted(company.id));
        }

        if let Some(existing) = self
            .store
            .applications
            .all()
            .into_iter()
            .find(|a| a.record.job_id == job.id && a.record.student_id == actor.id)
        {
            tracing::debug!(application_id = %existing.record.id, "student already applied");
            return Ok(Applied::Existing(existing));
        }

        let now = self.clock.now();
        let application = Application {
            id: Uuid::new_v4(),
            student_id: actor.id,
            student_name: payload.student_name.trim().to_string(),
            job_id: job.id,
            company_id: company.id,
            job_title: job.title.clone(),
            company_name: company.name.clone(),
            applied_date: now,
            status: ApplicationStatus::Pending,
            resume_url: payload.resume_url,
            cover_letter_url: payload.cover_letter_url,
            additional_docs: payload.additional_docs,
            started_at: None,
            completed_at: None,
            timeline: vec![ApplicationTimelineEntry::created(
                actor,
                now,
                ApplicationStatus::Pending,
            )],
        };
        let created = self.store.applications.insert(application)?;
        drop(job_entry);

        tracing::info!(application_id = %created.record.id, job_id = %job.id, student = %actor.id, "application created");
        self.notifications.publish(DomainEvent::new(
            EventKind::ApplicationReceived,
            Recipient::user(Actor::company(company.id)),
            EntityType::Application,
            created.record.id,
            format!(
                "{} applied for {}",
                created.record.student_name, created.record.job_title
            ),
            now,
        ));
        Ok(Applied::Created(created))
    }

    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<Versioned<Application>> {
        let application = self.store.applications.get(id)?;
        authorization::authorize(actor, Operation::Read, &application.record.scope())?;
        Ok(application)
    }

    /// Moves an application through the hiring pipeline. Only the company
    /// that owns the listing may do this.
    pub async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: TransitionApplicationPayload,
    ) -> Result<Versioned<Application>> {
        let observed = self.store.applications.get(id)?;
        let entry = self.store.applications.lock(id).await?;
        let mut application = entry.current().record;

        authorization::authorize_scope(
            actor,
            Operation::TransitionApplication,
            &application.scope(),
        )?;
        entry.check_version(payload.expected_version.or(Some(observed.version)))?;

        let action = payload.action;
        let from = application.status;
        let step = transition::validate(APPLICATION_TRANSITIONS, from, action)?;
        if !step.permits(actor.role) {
            tracing::warn!(actor = %actor, application_id = %id, "only the hiring company may move an application");
            return Err(Error::forbidden(Rule::CompanyDrivesApplications));
        }

        let now = self.clock.now();
        match action {
            ApplicationAction::MarkCurrent => application.started_at = Some(now),
            ApplicationAction::MarkCompleted => {
                let job = self.store.jobs.get(application.job_id)?.record;
                let started_at = application.started_at.unwrap_or(application.applied_date);
                if !payload.explicit && !job.window_elapsed(started_at, now) {
                    return Err(transition::guard_failed(
                        APPLICATION_TRANSITIONS,
                        from,
                        action,
                        format!(
                            "the {}-week internship runs until {}; complete explicitly to override",
                            job.duration_weeks,
                            (started_at + job.duration()).date_naive()
                        ),
                    ));
                }
                application.completed_at = Some(now);
            }
            _ => {}
        }

        let note = payload
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        application.status = step.to;
        application.timeline.push(ApplicationTimelineEntry::transition(
            actor, now, action, from, step.to, note,
        ));

        let committed = entry.commit(application);
        tracing::info!(
            application_id = %id,
            actor = %actor,
            %action,
            %from,
            to = %step.to,
            version = committed.version,
            "application transitioned"
        );
        self.notifications
            .publish_all(application_events(&committed.record, action, now));
        Ok(committed)
    }
}

fn application_events(
    application: &Application,
    action: ApplicationAction,
    at: chrono::DateTime<chrono::Utc>,
) -> Vec<DomainEvent> {
    let student = Recipient::user(Actor::student(application.student_id));
    let event = |kind, recipient, message: String| {
        DomainEvent::new(
            kind,
            recipient,
            EntityType::Application,
            application.id,
            message,
            at,
        )
    };
    let position = format!("{} at {}", application.job_title, application.company_name);

    match action {
        ApplicationAction::Finalize => vec![event(
            EventKind::ApplicationFinalized,
            student,
            format!("You were shortlisted for {}", position),
        )],
        ApplicationAction::Accept => vec![event(
            EventKind::ApplicationAccepted,
            student,
            format!("You were accepted for {}", position),
        )],
        ApplicationAction::Reject => vec![event(
            EventKind::ApplicationRejected,
            student,
            format!("Your application for {} was not successful", position),
        )],
        ApplicationAction::MarkCurrent => vec![event(
            EventKind::InternshipStarted,
            student,
            format!("Your internship as {} has started", position),
        )],
        ApplicationAction::MarkCompleted => vec![
            event(
                EventKind::InternshipCompleted,
                student,
                format!("Your internship as {} is complete", position),
            ),
            event(
                EventKind::EvaluationRequested,
                Recipient::user(Actor::company(application.company_id)),
                format!(
                    "Please evaluate {} for {}",
                    application.student_name, application.job_title
                ),
            ),
        ],
    }
}
