use uuid::Uuid;

use crate::dto::submission_dto::{
    AssignFacultyPayload, CreateSubmissionPayload, DocumentPayload, TransitionSubmissionPayload,
};
use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Recipient, Role},
    entity::EntityType,
    event::{DomainEvent, EventKind},
    submission::{
        Document, DocumentKind, Submission, SubmissionAction, SubmissionStatus,
        SubmissionTimelineEntry,
    },
};
use crate::services::{
    audit_service::AuditService,
    authorization::{self, Operation, Rule, Scoped},
    notification_service::NotificationService,
    transition::{self, SUBMISSION_TRANSITIONS},
};
use crate::store::{EntityStore, Versioned};
use crate::utils::time::{today, SharedClock};

#[derive(Clone)]
pub struct SubmissionService {
    store: EntityStore,
    clock: SharedClock,
    notifications: NotificationService,
    audit: AuditService,
}

fn attach(documents: Vec<DocumentPayload>, at: chrono::DateTime<chrono::Utc>) -> Vec<Document> {
    documents
        .into_iter()
        .map(|d| Document {
            kind: d.kind,
            url: d.url,
            name: d.name,
            attached_at: at,
        })
        .collect()
}

fn non_blank(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl SubmissionService {
    pub fn new(
        store: EntityStore,
        clock: SharedClock,
        notifications: NotificationService,
        audit: AuditService,
    ) -> Self {
        Self {
            store,
            clock,
            notifications,
            audit,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateSubmissionPayload,
    ) -> Result<Versioned<Submission>> {
        authorization::authorize_role(actor, Operation::CreateSubmission)?;

        let cycle = self.store.cycles.get(payload.cycle_id)?.record;
        if !cycle.accepts_submissions(today(self.clock.as_ref())) {
            return Err(Error::InactiveCycle(cycle.id));
        }
        if let Some(company_id) = payload.company_id {
            self.store.companies.get(company_id)?;
        }
        if !payload
            .documents
            .iter()
            .any(|d| d.kind == DocumentKind::EvaluationForm)
        {
            return Err(Error::MissingRequiredDocument(
                "an evaluation form must be attached".to_string(),
            ));
        }

        let now = self.clock.now();
        let submission = Submission {
            id: Uuid::new_v4(),
            student_id: actor.id,
            student_name: payload.student_name.trim().to_string(),
            cycle_id: cycle.id,
            company_id: payload.company_id,
            company: payload.company.into(),
            faculty_assigned: None,
            status: SubmissionStatus::Pending,
            submission_date: now,
            documents: attach(payload.documents, now),
            timeline: vec![SubmissionTimelineEntry::created(
                actor,
                now,
                SubmissionStatus::Pending,
            )],
            feedback: None,
        };
        let created = self.store.submissions.insert(submission)?;

        tracing::info!(submission_id = %created.record.id, cycle_id = %cycle.id, student = %actor.id, "submission created");
        self.notifications.publish(DomainEvent::new(
            EventKind::SubmissionCreated,
            Recipient::office(Role::Scad),
            EntityType::Submission,
            created.record.id,
            format!(
                "{} submitted an internship report for {}",
                created.record.student_name, created.record.company.company_name
            ),
            now,
        ));
        Ok(created)
    }

    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<Versioned<Submission>> {
        let submission = self.store.submissions.get(id)?;
        authorization::authorize(actor, Operation::Read, &submission.record.scope())?;
        Ok(submission)
    }

    /// Applies one state-machine move.
    ///
    /// Checks run in a fixed order before anything is written: ownership,
    /// version, legality of the move, role, then the move's own guard.
    /// Without an explicit `expected_version` the version read at the start
    /// of the call is used, so the loser of a race sees
    /// `ConcurrentModification` rather than a move evaluated against state
    /// it never observed.
    pub async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: TransitionSubmissionPayload,
    ) -> Result<Versioned<Submission>> {
        let observed = self.store.submissions.get(id)?;
        let entry = self.store.submissions.lock(id).await?;
        let mut submission = entry.current().record;

        authorization::authorize_scope(actor, Operation::Transition, &submission.scope())?;
        entry.check_version(payload.expected_version.or(Some(observed.version)))?;

        let action = payload.action;
        let from = submission.status;
        let step = transition::validate(SUBMISSION_TRANSITIONS, from, action)?;
        if !step.permits(actor.role) {
            return Err(forbidden(actor, Rule::RoleNotPermitted));
        }

        let note = non_blank(payload.note);
        let now = self.clock.now();
        match action {
            SubmissionAction::Flag if note.is_none() => {
                return Err(Error::MissingReason(
                    "flagging a submission requires a note for the student".to_string(),
                ));
            }
            SubmissionAction::Resubmit if payload.documents.is_empty() => {
                return Err(Error::MissingRequiredDocument(
                    "resubmitting requires at least one new document".to_string(),
                ));
            }
            SubmissionAction::Finalize if !payload.explicit => {
                let cycle = self.store.cycles.get(submission.cycle_id)?.record;
                if !cycle.is_closed(today(self.clock.as_ref())) {
                    return Err(transition::guard_failed(
                        SUBMISSION_TRANSITIONS,
                        from,
                        action,
                        format!(
                            "cycle {} is open until {}; finalize explicitly to override",
                            cycle.name, cycle.end_date
                        ),
                    ));
                }
            }
            _ => {}
        }

        if action.is_review() && note.is_some() {
            submission.feedback = note.clone();
        }
        if action == SubmissionAction::Resubmit {
            submission.documents.extend(attach(payload.documents, now));
        }
        submission.status = step.to;
        submission.timeline.push(SubmissionTimelineEntry::transition(
            actor,
            now,
            action,
            from,
            step.to,
            note.clone(),
        ));

        let committed = entry.commit(submission);
        tracing::info!(
            submission_id = %id,
            actor = %actor,
            %action,
            %from,
            to = %step.to,
            version = committed.version,
            "submission transitioned"
        );
        self.notifications
            .publish_all(submission_events(&committed.record, action, note, now));
        Ok(committed)
    }

    /// Points a submission at a reviewer. Reassignment is allowed until the
    /// submission reaches a terminal state.
    pub async fn assign_faculty(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: AssignFacultyPayload,
    ) -> Result<Versioned<Submission>> {
        authorization::authorize_role(actor, Operation::AssignFaculty)?;

        let entry = self.store.submissions.lock(id).await?;
        entry.check_version(payload.expected_version)?;
        let mut submission = entry.current().record;
        if submission.status.is_terminal() {
            return Err(Error::InvalidTransition {
                from: submission.status.to_string(),
                action: "assign".to_string(),
                allowed: Vec::new(),
                reason: Some("terminal submissions cannot be reassigned".to_string()),
            });
        }

        let previous = submission.faculty_assigned.replace(payload.faculty_id);
        let committed = entry.commit(submission);

        self.audit.log(
            actor,
            "assign_faculty",
            EntityType::Submission,
            id,
            Some(serde_json::json!({ "from": previous, "to": payload.faculty_id })),
        );
        tracing::info!(submission_id = %id, faculty_id = %payload.faculty_id, "faculty assigned");

        let now = self.clock.now();
        self.notifications.publish(DomainEvent::new(
            EventKind::SubmissionAssigned,
            Recipient::user(Actor::faculty(payload.faculty_id)),
            EntityType::Submission,
            id,
            format!(
                "You have been assigned the report of {}",
                committed.record.student_name
            ),
            now,
        ));
        Ok(committed)
    }
}

fn forbidden(actor: &Actor, rule: Rule) -> Error {
    tracing::warn!(actor = %actor, rule = rule.as_str(), "request denied");
    Error::forbidden(rule)
}

fn submission_events(
    submission: &Submission,
    action: SubmissionAction,
    note: Option<String>,
    at: chrono::DateTime<chrono::Utc>,
) -> Vec<DomainEvent> {
    let student = Recipient::user(Actor::student(submission.student_id));
    let event = |kind, recipient, message: String| {
        DomainEvent::new(
            kind,
            recipient,
            EntityType::Submission,
            submission.id,
            message,
            at,
        )
    };
    let company = &submission.company.company_name;

    match action {
        SubmissionAction::Approve => vec![event(
            EventKind::SubmissionApproved,
            student,
            format!("Your internship report for {} was approved", company),
        )
        .with_note(note)],
        SubmissionAction::Reject => vec![event(
            EventKind::SubmissionRejected,
            student,
            format!("Your internship report for {} was rejected", company),
        )
        .with_note(note)],
        SubmissionAction::Flag => vec![event(
            EventKind::SubmissionFlagged,
            student,
            format!("Your internship report for {} needs changes", company),
        )
        .with_note(note)],
        SubmissionAction::Resubmit => submission
            .faculty_assigned
            .map(|faculty| {
                event(
                    EventKind::SubmissionResubmitted,
                    Recipient::user(Actor::faculty(faculty)),
                    format!("{} resubmitted their report", submission.student_name),
                )
            })
            .into_iter()
            .collect(),
        SubmissionAction::Finalize => vec![event(
            EventKind::SubmissionCompleted,
            student,
            format!("Your internship report for {} is complete", company),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dto::submission_dto::CompanyInfoPayload;
    use crate::models::cycle::{CycleStatus, SubmissionCycle};
    use crate::utils::time::ManualClock;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    struct Fixture {
        service: SubmissionService,
        store: EntityStore,
        cycle_id: Uuid,
        student: Actor,
        scad: Actor,
    }

    fn fixture() -> Fixture {
        let clock: SharedClock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let config = Config::local("secret");
        let store = EntityStore::new(config.lock_timeout);
        let cycle = store
            .cycles
            .insert(SubmissionCycle {
                id: Uuid::new_v4(),
                name: "Spring".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                status: CycleStatus::Active,
                created_at: clock.now(),
            })
            .unwrap();
        let service = SubmissionService::new(
            store.clone(),
            clock.clone(),
            NotificationService::new(&config, clock.clone()),
            AuditService::new(clock),
        );
        Fixture {
            service,
            store,
            cycle_id: cycle.record.id,
            student: Actor::student(Uuid::new_v4()),
            scad: Actor::scad(Uuid::new_v4()),
        }
    }

    fn report(cycle_id: Uuid, documents: Vec<DocumentPayload>) -> CreateSubmissionPayload {
        CreateSubmissionPayload {
            cycle_id,
            student_name: "Nour Tarek".to_string(),
            company_id: None,
            company: CompanyInfoPayload {
                company_name: "Alex Marine".to_string(),
                company_address: None,
                supervisor_name: "Karim".to_string(),
                supervisor_email: "karim@alex.example".to_string(),
                position_title: None,
                start_date: None,
                end_date: None,
            },
            documents,
        }
    }

    fn document(kind: DocumentKind, url: &str) -> DocumentPayload {
        DocumentPayload {
            kind,
            url: url.to_string(),
            name: None,
        }
    }

    #[tokio::test]
    async fn report_without_evaluation_form_is_refused() {
        let f = fixture();
        let result = f
            .service
            .create(
                &f.student,
                report(f.cycle_id, vec![document(DocumentKind::CoverLetter, "docs://cl")]),
            )
            .await;
        assert!(matches!(result, Err(Error::MissingRequiredDocument(_))));
        assert!(f.store.submissions.is_empty());
    }

    #[tokio::test]
    async fn resubmit_needs_a_new_document() {
        let f = fixture();
        let faculty = Actor::faculty(Uuid::new_v4());
        let created = f
            .service
            .create(
                &f.student,
                report(f.cycle_id, vec![document(DocumentKind::EvaluationForm, "docs://f")]),
            )
            .await
            .unwrap();
        let id = created.record.id;
        f.service
            .assign_faculty(
                &f.scad,
                id,
                AssignFacultyPayload {
                    faculty_id: faculty.id,
                    expected_version: None,
                },
            )
            .await
            .unwrap();

        let mut flag = TransitionSubmissionPayload::new(SubmissionAction::Flag);
        flag.note = Some("Missing signature".to_string());
        let flagged = f.service.transition(&faculty, id, flag).await.unwrap();

        let result = f
            .service
            .transition(
                &f.student,
                id,
                TransitionSubmissionPayload::new(SubmissionAction::Resubmit),
            )
            .await;
        assert!(matches!(result, Err(Error::MissingRequiredDocument(_))));
        assert_eq!(f.store.submissions.get(id).unwrap(), flagged);
    }

    #[tokio::test]
    async fn unassigned_reports_cannot_be_reviewed() {
        let f = fixture();
        let created = f
            .service
            .create(
                &f.student,
                report(f.cycle_id, vec![document(DocumentKind::EvaluationForm, "docs://f")]),
            )
            .await
            .unwrap();
        let id = created.record.id;

        let mut flag = TransitionSubmissionPayload::new(SubmissionAction::Flag);
        flag.note = Some("Too short".to_string());
        let review_actions = [
            TransitionSubmissionPayload::new(SubmissionAction::Approve),
            TransitionSubmissionPayload::new(SubmissionAction::Reject),
            flag,
        ];

        let faculty = Actor::faculty(Uuid::new_v4());
        for payload in review_actions.clone() {
            match f.service.transition(&faculty, id, payload).await {
                Err(Error::Forbidden { rule }) => assert_eq!(rule, Rule::FacultyAssigned),
                other => panic!("unassigned faculty review: {:?}", other),
            }
        }
        for payload in review_actions {
            match f.service.transition(&f.scad, id, payload).await {
                Err(Error::Forbidden { rule }) => assert_eq!(rule, Rule::RoleNotPermitted),
                other => panic!("scad review: {:?}", other),
            }
        }

        let stored = f.store.submissions.get(id).unwrap();
        assert_eq!(stored, created);
        assert_eq!(stored.record.status, SubmissionStatus::Pending);
    }
}
