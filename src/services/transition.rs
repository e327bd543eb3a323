//! State-machine tables for submissions, applications and company reviews.
//!
//! Each table lists every legal move together with the roles allowed to take
//! it. Guards that depend on more than the current status (cycle closure,
//! attached documents, job windows) live in the services.

use std::fmt;

use crate::error::{Error, Result};
use crate::models::{
    actor::Role,
    application::{ApplicationAction, ApplicationStatus},
    company::{CompanyDecision, CompanyStatus},
    submission::{SubmissionAction, SubmissionStatus},
    timeline::TimelineEntry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S: 'static, A> {
    /// States this move may start from
    pub from: &'static [S],
    pub action: A,
    /// The target state
    pub to: S,
    /// The roles that are permitted to use this transition
    pub roles: &'static [Role],
    pub description: &'static str,
}

impl<S: Copy + PartialEq, A> Transition<S, A> {
    pub fn starts_from(&self, status: S) -> bool {
        self.from.contains(&status)
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

pub type SubmissionTransition = Transition<SubmissionStatus, SubmissionAction>;
pub type ApplicationTransition = Transition<ApplicationStatus, ApplicationAction>;
pub type CompanyTransition = Transition<CompanyStatus, CompanyDecision>;

const REVIEWABLE: &[SubmissionStatus] = &[SubmissionStatus::Pending, SubmissionStatus::Flagged];

pub static SUBMISSION_TRANSITIONS: &[SubmissionTransition] = &[
    Transition {
        from: REVIEWABLE,
        action: SubmissionAction::Approve,
        to: SubmissionStatus::Approved,
        roles: &[Role::Faculty],
        description: "Approve the report",
    },
    Transition {
        from: REVIEWABLE,
        action: SubmissionAction::Reject,
        to: SubmissionStatus::Rejected,
        roles: &[Role::Faculty],
        description: "Reject the report",
    },
    Transition {
        from: &[SubmissionStatus::Pending],
        action: SubmissionAction::Flag,
        to: SubmissionStatus::Flagged,
        roles: &[Role::Faculty],
        description: "Flag the report for changes",
    },
    Transition {
        from: &[SubmissionStatus::Flagged],
        action: SubmissionAction::Resubmit,
        to: SubmissionStatus::Pending,
        roles: &[Role::Student],
        description: "Resubmit with new documents",
    },
    Transition {
        from: &[SubmissionStatus::Approved],
        action: SubmissionAction::Finalize,
        to: SubmissionStatus::Completed,
        roles: &[Role::Scad, Role::Faculty],
        description: "Finalize after the cycle closes",
    },
];

const OPEN_APPLICATION: &[ApplicationStatus] =
    &[ApplicationStatus::Pending, ApplicationStatus::Finalized];

pub static APPLICATION_TRANSITIONS: &[ApplicationTransition] = &[
    Transition {
        from: &[ApplicationStatus::Pending],
        action: ApplicationAction::Finalize,
        to: ApplicationStatus::Finalized,
        roles: &[Role::Company],
        description: "Shortlist the applicant",
    },
    Transition {
        from: OPEN_APPLICATION,
        action: ApplicationAction::Accept,
        to: ApplicationStatus::Accepted,
        roles: &[Role::Company],
        description: "Accept the applicant",
    },
    Transition {
        from: OPEN_APPLICATION,
        action: ApplicationAction::Reject,
        to: ApplicationStatus::Rejected,
        roles: &[Role::Company],
        description: "Reject the applicant",
    },
    Transition {
        from: &[ApplicationStatus::Accepted],
        action: ApplicationAction::MarkCurrent,
        to: ApplicationStatus::Current,
        roles: &[Role::Company],
        description: "Internship has started",
    },
    Transition {
        from: &[ApplicationStatus::Current],
        action: ApplicationAction::MarkCompleted,
        to: ApplicationStatus::Completed,
        roles: &[Role::Company],
        description: "Internship has finished",
    },
];

pub static COMPANY_TRANSITIONS: &[CompanyTransition] = &[
    Transition {
        from: &[CompanyStatus::Pending],
        action: CompanyDecision::Approve,
        to: CompanyStatus::Approved,
        roles: &[Role::Scad],
        description: "Approve the registration",
    },
    Transition {
        from: &[CompanyStatus::Pending],
        action: CompanyDecision::Reject,
        to: CompanyStatus::Rejected,
        roles: &[Role::Scad],
        description: "Reject the registration",
    },
];

pub fn find<S, A>(
    table: &'static [Transition<S, A>],
    from: S,
    action: A,
) -> Option<&'static Transition<S, A>>
where
    S: Copy + PartialEq,
    A: Copy + PartialEq,
{
    table
        .iter()
        .find(|t| t.action == action && t.starts_from(from))
}

/// Distinct states reachable from `from` in one move, in table order.
pub fn allowed_next<S, A>(table: &'static [Transition<S, A>], from: S) -> Vec<S>
where
    S: Copy + PartialEq,
{
    let mut next = Vec::new();
    for t in table.iter().filter(|t| t.starts_from(from)) {
        if !next.contains(&t.to) {
            next.push(t.to);
        }
    }
    next
}

pub fn invalid<S, A>(table: &'static [Transition<S, A>], from: S, action: A) -> Error
where
    S: Copy + PartialEq + fmt::Display,
    A: fmt::Display,
{
    Error::InvalidTransition {
        from: from.to_string(),
        action: action.to_string(),
        allowed: allowed_next(table, from)
            .iter()
            .map(ToString::to_string)
            .collect(),
        reason: None,
    }
}

/// Looks up the move for `action` from `from`, or fails with the states that
/// are reachable instead.
pub fn validate<S, A>(
    table: &'static [Transition<S, A>],
    from: S,
    action: A,
) -> Result<&'static Transition<S, A>>
where
    S: Copy + PartialEq + fmt::Display,
    A: Copy + PartialEq + fmt::Display,
{
    find(table, from, action).ok_or_else(|| invalid(table, from, action))
}

/// An otherwise legal move whose guard does not hold yet.
pub fn guard_failed<S, A>(
    table: &'static [Transition<S, A>],
    from: S,
    action: A,
    reason: impl Into<String>,
) -> Error
where
    S: Copy + PartialEq + fmt::Display,
    A: fmt::Display,
{
    match invalid(table, from, action) {
        Error::InvalidTransition {
            from,
            action,
            allowed,
            ..
        } => Error::InvalidTransition {
            from,
            action,
            allowed,
            reason: Some(reason.into()),
        },
        other => other,
    }
}

/// Rebuilds the current status from a timeline by walking it through `table`.
///
/// The first entry must be the creation record in `initial`; every later
/// entry must be a legal move landing where the table says it lands.
pub fn replay<S, A>(
    table: &'static [Transition<S, A>],
    initial: S,
    timeline: &[TimelineEntry<S, A>],
) -> Result<S>
where
    S: Copy + PartialEq + fmt::Display,
    A: Copy + PartialEq + fmt::Display,
{
    let mut entries = timeline.iter();
    match entries.next() {
        Some(first) if first.action.is_none() && first.to == initial => {}
        _ => {
            return Err(Error::Internal(format!(
                "timeline does not start with creation in {}",
                initial
            )))
        }
    }

    let mut status = initial;
    for entry in entries {
        let action = entry.action.ok_or_else(|| {
            Error::Internal("creation entry in the middle of a timeline".to_string())
        })?;
        let transition = validate(table, status, action)?;
        if transition.to != entry.to || entry.from.map_or(false, |from| from != status) {
            return Err(Error::Internal(format!(
                "timeline entry {} does not match {} -> {}",
                action, status, transition.to
            )));
        }
        status = transition.to;
    }
    Ok(status)
}
