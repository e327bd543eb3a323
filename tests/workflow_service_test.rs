use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use internship_workflow::{
    config::Config,
    dto::{
        application_dto::{CreateApplicationPayload, TransitionApplicationPayload},
        company_dto::{BlacklistPayload, RegisterCompanyPayload, ReviewCompanyPayload},
        cycle_dto::CreateCyclePayload,
        evaluation_dto::EvaluationPayload,
        job_dto::CreateJobPayload,
        list_dto::ListQuery,
        submission_dto::{
            AssignFacultyPayload, CompanyInfoPayload, CreateSubmissionPayload, DocumentPayload,
            TransitionSubmissionPayload,
        },
    },
    error::Error,
    models::{
        actor::Actor,
        application::{ApplicationAction, ApplicationStatus},
        company::{CompanyDecision, CompanySize},
        entity::EntityType,
        event::EventKind,
        submission::{DocumentKind, Submission, SubmissionAction, SubmissionStatus},
    },
    services::{
        query_service::EntityList,
        transition::{self, SUBMISSION_TRANSITIONS},
    },
    store::Versioned,
    utils::time::ManualClock,
    AppState,
};
use uuid::Uuid;

struct Harness {
    state: AppState,
    clock: ManualClock,
    scad: Actor,
}

async fn harness() -> Harness {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
    let state = AppState::with_clock(Config::local("secret"), Arc::new(clock.clone()));
    let scad = Actor::scad(Uuid::new_v4());
    Harness { state, clock, scad }
}

impl Harness {
    async fn open_cycle(&self) -> Uuid {
        self.state
            .cycle_service
            .create(
                &self.scad,
                CreateCyclePayload {
                    name: "Spring 2025".to_string(),
                    start_date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                    activate: true,
                },
            )
            .await
            .unwrap()
            .record
            .id
    }

    async fn submit(
        &self,
        student: Actor,
        cycle_id: Uuid,
        company_id: Option<Uuid>,
    ) -> Versioned<Submission> {
        self.state
            .submission_service
            .create(
                &student,
                CreateSubmissionPayload {
                    cycle_id,
                    student_name: "Youssef Samir".to_string(),
                    company_id,
                    company: CompanyInfoPayload {
                        company_name: "Nile Robotics".to_string(),
                        company_address: None,
                        supervisor_name: "Omar Hany".to_string(),
                        supervisor_email: "omar@nile.example".to_string(),
                        position_title: Some("Intern".to_string()),
                        start_date: None,
                        end_date: None,
                    },
                    documents: vec![DocumentPayload {
                        kind: DocumentKind::EvaluationForm,
                        url: "docs://forms/1".to_string(),
                        name: None,
                    }],
                },
            )
            .await
            .unwrap()
    }

    async fn assign(&self, submission_id: Uuid, faculty: Actor) {
        self.state
            .submission_service
            .assign_faculty(
                &self.scad,
                submission_id,
                AssignFacultyPayload {
                    faculty_id: faculty.id,
                    expected_version: None,
                },
            )
            .await
            .unwrap();
    }

    /// Registers and approves a company; returns its actor.
    async fn approved_company(&self) -> Actor {
        let company = Actor::company(Uuid::new_v4());
        self.state
            .company_service
            .register(
                &company,
                RegisterCompanyPayload {
                    name: "Cairo Cloud".to_string(),
                    industry: "Software".to_string(),
                    size: CompanySize::Medium,
                    email: "hr@cairo.example".to_string(),
                    description: None,
                },
            )
            .unwrap();
        self.state
            .company_service
            .review(
                &self.scad,
                company.id,
                ReviewCompanyPayload {
                    decision: CompanyDecision::Approve,
                    note: None,
                    expected_version: None,
                },
            )
            .await
            .unwrap();
        company
    }

    fn post_job(&self, company: Actor, weeks: u32) -> Uuid {
        self.state
            .job_service
            .create(
                &company,
                CreateJobPayload {
                    title: "Backend Intern".to_string(),
                    description: "Work on the billing service".to_string(),
                    duration_weeks: weeks,
                    paid: false,
                    salary: None,
                    skills: vec!["rust".to_string()],
                },
            )
            .unwrap()
            .record
            .id
    }

    async fn apply(&self, student: Actor, job_id: Uuid) -> Result<Uuid, Error> {
        self.state
            .application_service
            .create(
                &student,
                CreateApplicationPayload {
                    job_id,
                    student_name: "Salma Nabil".to_string(),
                    resume_url: "docs://cv/1".to_string(),
                    cover_letter_url: None,
                    additional_docs: Default::default(),
                },
            )
            .await
            .map(|applied| applied.into_inner().record.id)
    }
}

#[tokio::test]
async fn internship_runs_to_evaluation() {
    let h = harness().await;
    let company = h.approved_company().await;
    let student = Actor::student(Uuid::new_v4());
    let job_id = h.post_job(company, 8);
    let app_id = h.apply(student, job_id).await.unwrap();

    let apps = &h.state.application_service;
    for (action, expected) in [
        (ApplicationAction::Finalize, ApplicationStatus::Finalized),
        (ApplicationAction::Accept, ApplicationStatus::Accepted),
        (ApplicationAction::MarkCurrent, ApplicationStatus::Current),
    ] {
        let app = apps
            .transition(&company, app_id, TransitionApplicationPayload::new(action))
            .await
            .unwrap();
        assert_eq!(app.record.status, expected);
    }

    // Too early: the job window has not elapsed.
    let early = apps
        .transition(
            &company,
            app_id,
            TransitionApplicationPayload::new(ApplicationAction::MarkCompleted),
        )
        .await;
    assert!(matches!(early, Err(Error::InvalidTransition { .. })));

    h.clock.advance(Duration::weeks(8) + Duration::days(1));
    let done = apps
        .transition(
            &company,
            app_id,
            TransitionApplicationPayload::new(ApplicationAction::MarkCompleted),
        )
        .await
        .unwrap();
    assert_eq!(done.record.status, ApplicationStatus::Completed);
    assert!(done.record.completed_at.is_some());

    let evals = &h.state.evaluation_service;
    let evaluation = evals
        .create(&company, app_id, EvaluationPayload::new(4, "Reliable and curious"))
        .await
        .unwrap();
    assert_eq!(evaluation.record.rating, 4);

    let second = evals
        .create(&company, app_id, EvaluationPayload::new(5, "Again"))
        .await;
    assert!(matches!(second, Err(Error::DuplicateEvaluation(id)) if id == app_id));

    let requested = h.state.notification_service.inbox(&company);
    assert!(requested
        .iter()
        .any(|e| e.kind == EventKind::EvaluationRequested && e.entity_id == app_id));
    let completed = h.state.notification_service.inbox(&student);
    assert!(completed
        .iter()
        .any(|e| e.kind == EventKind::InternshipCompleted));
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let h = harness().await;
    let company = h.approved_company().await;
    let student = Actor::student(Uuid::new_v4());
    let job_id = h.post_job(company, 1);
    let app_id = h.apply(student, job_id).await.unwrap();

    let apps = &h.state.application_service;
    for action in [
        ApplicationAction::Accept,
        ApplicationAction::MarkCurrent,
    ] {
        apps.transition(&company, app_id, TransitionApplicationPayload::new(action))
            .await
            .unwrap();
    }
    let mut finish = TransitionApplicationPayload::new(ApplicationAction::MarkCompleted);
    finish.explicit = true;
    apps.transition(&company, app_id, finish).await.unwrap();

    let result = h
        .state
        .evaluation_service
        .create(&company, app_id, EvaluationPayload::new(6, "Too generous"))
        .await;
    assert!(matches!(result, Err(Error::InvalidRating(Some(6)))));
    assert!(h.state.store.evaluation_for_application(app_id).is_none());
}

#[tokio::test]
async fn blacklisted_company_takes_no_applications() {
    let h = harness().await;
    let company = h.approved_company().await;
    let job_id = h.post_job(company, 4);

    h.state
        .company_service
        .set_blacklist(
            &h.scad,
            company.id,
            BlacklistPayload {
                blacklisted: true,
                reason: Some("Unpaid overtime reports".to_string()),
                expected_version: None,
            },
        )
        .await
        .unwrap();

    let student = Actor::student(Uuid::new_v4());
    let result = h.apply(student, job_id).await;
    assert!(matches!(result, Err(Error::CompanyBlacklisted(id)) if id == company.id));
    assert!(h.state.store.applications.is_empty());
}

#[tokio::test]
async fn blacklisting_requires_a_reason() {
    let h = harness().await;
    let company = h.approved_company().await;
    let before = h.state.store.companies.get(company.id).unwrap();

    let result = h
        .state
        .company_service
        .set_blacklist(
            &h.scad,
            company.id,
            BlacklistPayload {
                blacklisted: true,
                reason: Some("   ".to_string()),
                expected_version: None,
            },
        )
        .await;
    assert!(matches!(result, Err(Error::MissingReason(_))));

    let after = h.state.store.companies.get(company.id).unwrap();
    assert!(!after.record.blacklisted);
    assert_eq!(after.version, before.version);
}

#[tokio::test]
async fn terminal_submissions_reject_every_actor() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    let company = h.approved_company().await;
    let student = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());

    let submission = h.submit(student, cycle_id, Some(company.id)).await;
    let id = submission.record.id;
    h.assign(id, faculty).await;

    let mut reject = TransitionSubmissionPayload::new(SubmissionAction::Reject);
    reject.note = Some("Wrong company letterhead".to_string());
    let rejected = h
        .state
        .submission_service
        .transition(&faculty, id, reject)
        .await
        .unwrap();
    assert_eq!(rejected.record.status, SubmissionStatus::Rejected);

    let actions = [
        SubmissionAction::Approve,
        SubmissionAction::Reject,
        SubmissionAction::Flag,
        SubmissionAction::Resubmit,
        SubmissionAction::Finalize,
    ];
    for actor in [student, faculty, h.scad, company] {
        for action in actions {
            let mut payload = TransitionSubmissionPayload::new(action);
            payload.note = Some("again".to_string());
            payload.explicit = true;
            let result = h
                .state
                .submission_service
                .transition(&actor, id, payload)
                .await;
            match result {
                Err(Error::InvalidTransition { from, allowed, .. }) => {
                    assert_eq!(from, "rejected");
                    assert!(allowed.is_empty());
                }
                other => panic!("{} {} on rejected: {:?}", actor, action, other),
            }
        }
    }
    assert_eq!(h.state.store.submissions.get(id).unwrap().version, rejected.version);
}

#[tokio::test]
async fn racing_reviews_have_one_winner() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    let student = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());
    let submission = h.submit(student, cycle_id, None).await;
    let id = submission.record.id;
    h.assign(id, faculty).await;
    let seen = h.state.store.submissions.get(id).unwrap().version;

    let mut approve = TransitionSubmissionPayload::new(SubmissionAction::Approve);
    approve.expected_version = Some(seen);
    let mut reject = TransitionSubmissionPayload::new(SubmissionAction::Reject);
    reject.expected_version = Some(seen);

    let service = &h.state.submission_service;
    let (a, b) = tokio::join!(
        service.transition(&faculty, id, approve),
        service.transition(&faculty, id, reject)
    );

    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(e) if e.is_retryable()))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 1);

    let stored = h.state.store.submissions.get(id).unwrap();
    assert_eq!(stored.version, seen + 1);
    assert_eq!(stored.record.timeline.len(), 2);
}

#[tokio::test]
async fn status_always_matches_replayed_timeline() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    let student = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());
    let submission = h.submit(student, cycle_id, None).await;
    let id = submission.record.id;
    h.assign(id, faculty).await;

    let service = &h.state.submission_service;
    let mut flag = TransitionSubmissionPayload::new(SubmissionAction::Flag);
    flag.note = Some("Add the supervisor signature".to_string());
    let mut resubmit = TransitionSubmissionPayload::new(SubmissionAction::Resubmit);
    resubmit.documents = vec![DocumentPayload {
        kind: DocumentKind::Other,
        url: "docs://signed".to_string(),
        name: Some("signed.pdf".to_string()),
    }];
    let mut finalize = TransitionSubmissionPayload::new(SubmissionAction::Finalize);
    finalize.explicit = true;

    let steps = [
        (faculty, flag),
        (student, resubmit),
        (faculty, TransitionSubmissionPayload::new(SubmissionAction::Approve)),
        (h.scad, finalize),
    ];
    for (actor, payload) in steps {
        let current = service.transition(&actor, id, payload).await.unwrap();
        let replayed = transition::replay(
            SUBMISSION_TRANSITIONS,
            SubmissionStatus::Pending,
            &current.record.timeline,
        )
        .unwrap();
        assert_eq!(replayed, current.record.status);
    }

    let done = h.state.store.submissions.get(id).unwrap();
    assert_eq!(done.record.status, SubmissionStatus::Completed);
    assert_eq!(done.record.timeline.len(), 5);
    assert_eq!(done.record.documents.len(), 2);
}

#[tokio::test]
async fn flag_without_note_writes_nothing() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    let student = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());
    let submission = h.submit(student, cycle_id, None).await;
    let id = submission.record.id;
    h.assign(id, faculty).await;
    let before = h.state.store.submissions.get(id).unwrap();

    let result = h
        .state
        .submission_service
        .transition(&faculty, id, TransitionSubmissionPayload::new(SubmissionAction::Flag))
        .await;
    assert!(matches!(result, Err(Error::MissingReason(_))));
    assert_eq!(h.state.store.submissions.get(id).unwrap(), before);
}

#[tokio::test]
async fn submissions_outside_an_open_cycle_are_refused() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    h.state.cycle_service.close(&h.scad, cycle_id).await.unwrap();

    let student = Actor::student(Uuid::new_v4());
    let result = h
        .state
        .submission_service
        .create(
            &student,
            CreateSubmissionPayload {
                cycle_id,
                student_name: "Late".to_string(),
                company_id: None,
                company: CompanyInfoPayload {
                    company_name: "Any".to_string(),
                    company_address: None,
                    supervisor_name: "Any".to_string(),
                    supervisor_email: "any@any.example".to_string(),
                    position_title: None,
                    start_date: None,
                    end_date: None,
                },
                documents: vec![],
            },
        )
        .await;
    assert!(matches!(result, Err(Error::InactiveCycle(id)) if id == cycle_id));
    assert!(h.state.store.submissions.is_empty());
}

#[tokio::test]
async fn other_students_see_nothing() {
    let h = harness().await;
    let cycle_id = h.open_cycle().await;
    let owner = Actor::student(Uuid::new_v4());
    let stranger = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());
    let submission = h.submit(owner, cycle_id, None).await;
    h.assign(submission.record.id, faculty).await;

    let query = ListQuery::default();
    let list = |actor: Actor| match h
        .state
        .query_service
        .list_entities(&actor, EntityType::Submission, &query)
        .unwrap()
    {
        EntityList::Submissions(page) => page.total,
        _ => unreachable!(),
    };
    assert_eq!(list(owner), 1);
    assert_eq!(list(stranger), 0);
    assert_eq!(list(faculty), 1);
    assert_eq!(list(Actor::faculty(Uuid::new_v4())), 0);
    assert_eq!(list(h.scad), 1);

    let direct = h.state.submission_service.get(&stranger, submission.record.id);
    assert!(matches!(direct, Err(Error::Forbidden { .. })));
}

/// Runs an application to `completed` and returns (company, application id).
async fn completed_internship(h: &Harness) -> (Actor, Uuid) {
    let company = h.approved_company().await;
    let student = Actor::student(Uuid::new_v4());
    let job_id = h.post_job(company, 2);
    let app_id = h.apply(student, job_id).await.unwrap();
    let apps = &h.state.application_service;
    for action in [ApplicationAction::Accept, ApplicationAction::MarkCurrent] {
        apps.transition(&company, app_id, TransitionApplicationPayload::new(action))
            .await
            .unwrap();
    }
    h.clock.advance(Duration::weeks(2));
    apps.transition(
        &company,
        app_id,
        TransitionApplicationPayload::new(ApplicationAction::MarkCompleted),
    )
    .await
    .unwrap();
    (company, app_id)
}

#[tokio::test]
async fn editing_an_evaluation_keeps_its_submission_date() {
    let h = harness().await;
    let (company, app_id) = completed_internship(&h).await;
    let evals = &h.state.evaluation_service;

    let created = evals
        .create(&company, app_id, EvaluationPayload::new(3, "Good start"))
        .await
        .unwrap();

    h.clock.advance(Duration::days(3));
    let updated = evals
        .update(&company, app_id, EvaluationPayload::new(5, ""))
        .await
        .unwrap();
    assert_eq!(updated.record.rating, 5);
    assert_eq!(updated.record.comments, "");
    assert_eq!(updated.record.submitted_date, created.record.submitted_date);
    assert!(updated.record.updated_at.unwrap() > created.record.submitted_date);
    assert_eq!(updated.version, created.version + 1);

    let mut unrated = EvaluationPayload::new(4, "No rating");
    unrated.rating = None;
    let result = evals.update(&company, app_id, unrated).await;
    assert!(matches!(result, Err(Error::InvalidRating(None))));
    assert_eq!(
        h.state.store.evaluation_for_application(app_id).unwrap(),
        updated
    );

    let stranger = Actor::company(Uuid::new_v4());
    let result = evals
        .update(&stranger, app_id, EvaluationPayload::new(1, "Not mine"))
        .await;
    assert!(matches!(result, Err(Error::Forbidden { .. })));
}

#[tokio::test]
async fn deleting_an_evaluation_leaves_an_audit_snapshot() {
    let h = harness().await;
    let (company, app_id) = completed_internship(&h).await;
    let evals = &h.state.evaluation_service;

    let created = evals
        .create(&company, app_id, EvaluationPayload::new(2, "Often late"))
        .await
        .unwrap();
    let removed = evals.delete(&company, app_id).await.unwrap();
    assert_eq!(removed.id, created.record.id);

    assert!(h.state.store.evaluation_for_application(app_id).is_none());
    assert!(matches!(
        evals.get(&company, app_id),
        Err(Error::NotFound(_))
    ));

    let trail = h
        .state
        .audit_service
        .list(Some(EntityType::Evaluation), Some(created.record.id));
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, "delete_evaluation");
    let snapshot = trail[0].changes.as_ref().unwrap();
    assert_eq!(snapshot["rating"], 2);
    assert_eq!(snapshot["comments"], "Often late");

    // The slot is free again once the old evaluation is gone.
    let again = evals
        .create(&company, app_id, EvaluationPayload::new(4, "Second look"))
        .await
        .unwrap();
    assert_ne!(again.record.id, created.record.id);
}
