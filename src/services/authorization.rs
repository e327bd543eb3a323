//! Role and ownership checks applied before any workflow mutation.
//!
//! A check has two halves: the entity must be inside the actor's scope, and
//! the actor's role must be allowed to perform the operation. Denials always
//! carry the rule that failed.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Role},
    application::Application,
    company::Company,
    cycle::SubmissionCycle,
    evaluation::Evaluation,
    job::Job,
    submission::Submission,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    StudentOwnsEntity,
    CompanyOwnsEntity,
    FacultyAssigned,
    RoleNotPermitted,
    ScadOnly,
    StudentOnly,
    CompanyOnly,
    CompanyDrivesApplications,
    AuthoringCompanyOnly,
    CompanyNotApproved,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::StudentOwnsEntity => "student_owns_entity",
            Rule::CompanyOwnsEntity => "company_owns_entity",
            Rule::FacultyAssigned => "faculty_assigned",
            Rule::RoleNotPermitted => "role_not_permitted",
            Rule::ScadOnly => "scad_only",
            Rule::StudentOnly => "student_only",
            Rule::CompanyOnly => "company_only",
            Rule::CompanyDrivesApplications => "company_drives_applications",
            Rule::AuthoringCompanyOnly => "authoring_company_only",
            Rule::CompanyNotApproved => "company_not_approved",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Rule::StudentOwnsEntity => "students may only access their own records",
            Rule::CompanyOwnsEntity => "companies may only access records of their own listings",
            Rule::FacultyAssigned => "faculty may only access submissions assigned to them",
            Rule::RoleNotPermitted => "this role may not perform the requested action",
            Rule::ScadOnly => "only SCAD may perform this action",
            Rule::StudentOnly => "only students may perform this action",
            Rule::CompanyOnly => "only companies may perform this action",
            Rule::CompanyDrivesApplications => {
                "only the hiring company may move an application forward"
            }
            Rule::AuthoringCompanyOnly => "only the authoring company may change an evaluation",
            Rule::CompanyNotApproved => "the company profile has not been approved",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Rule),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn and_then(self, next: impl FnOnce() -> Decision) -> Decision {
        match self {
            Decision::Allow => next(),
            deny => deny,
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(rule) => Err(Error::forbidden(rule)),
        }
    }
}

/// Ownership facts of one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    pub student_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub faculty_id: Option<Uuid>,
    /// Readable by every authenticated actor (company directory, job board, cycles).
    pub public: bool,
}

impl Scope {
    pub fn public() -> Self {
        Self {
            public: true,
            ..Self::default()
        }
    }
}

pub trait Scoped {
    fn scope(&self) -> Scope;
}

impl Scoped for Submission {
    fn scope(&self) -> Scope {
        Scope {
            student_id: Some(self.student_id),
            company_id: self.company_id,
            faculty_id: self.faculty_assigned,
            public: false,
        }
    }
}

impl Scoped for Application {
    fn scope(&self) -> Scope {
        Scope {
            student_id: Some(self.student_id),
            company_id: Some(self.company_id),
            faculty_id: None,
            public: false,
        }
    }
}

impl Scoped for Evaluation {
    fn scope(&self) -> Scope {
        Scope {
            student_id: Some(self.student_id),
            company_id: Some(self.company_id),
            faculty_id: None,
            public: false,
        }
    }
}

impl Scoped for Company {
    fn scope(&self) -> Scope {
        Scope {
            company_id: Some(self.id),
            public: self.is_listed(),
            ..Scope::default()
        }
    }
}

impl Scoped for Job {
    /// Jobs of unlisted companies are hidden by the job service, which knows
    /// the owning company.
    fn scope(&self) -> Scope {
        Scope {
            company_id: Some(self.company_id),
            public: true,
            ..Scope::default()
        }
    }
}

impl Scoped for SubmissionCycle {
    fn scope(&self) -> Scope {
        Scope::public()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    CreateSubmission,
    /// Submission and application moves; the role check comes from the
    /// transition table.
    Transition,
    AssignFaculty,
    CreateApplication,
    TransitionApplication,
    WriteEvaluation,
    RegisterCompany,
    ReviewCompany,
    BlacklistCompany,
    PostJob,
    ManageCycles,
    Export,
    ReadAudit,
}

/// Whether `scope` falls inside what `actor` may see and touch.
pub fn in_scope(actor: &Actor, scope: &Scope) -> Decision {
    let owned = |owner: Option<Uuid>| owner == Some(actor.id);
    match actor.role {
        Role::Scad => Decision::Allow,
        Role::Student if owned(scope.student_id) => Decision::Allow,
        Role::Student => Decision::Deny(Rule::StudentOwnsEntity),
        Role::Company if owned(scope.company_id) => Decision::Allow,
        Role::Company => Decision::Deny(Rule::CompanyOwnsEntity),
        Role::Faculty if owned(scope.faculty_id) => Decision::Allow,
        Role::Faculty => Decision::Deny(Rule::FacultyAssigned),
    }
}

pub fn can_read(actor: &Actor, scope: &Scope) -> bool {
    scope.public || in_scope(actor, scope).is_allowed()
}

/// Role half of the gate.
pub fn permits(role: Role, operation: Operation) -> Decision {
    use Operation::*;

    let allow_if = |ok: bool, rule: Rule| if ok { Decision::Allow } else { Decision::Deny(rule) };
    match operation {
        Read | Transition => Decision::Allow,
        CreateSubmission | CreateApplication => allow_if(role == Role::Student, Rule::StudentOnly),
        TransitionApplication => allow_if(role == Role::Company, Rule::CompanyDrivesApplications),
        WriteEvaluation => allow_if(role == Role::Company, Rule::AuthoringCompanyOnly),
        RegisterCompany | PostJob => allow_if(role == Role::Company, Rule::CompanyOnly),
        AssignFaculty | ReviewCompany | BlacklistCompany | ManageCycles | Export | ReadAudit => {
            allow_if(role == Role::Scad, Rule::ScadOnly)
        }
    }
}

/// Full gate for an operation on an existing entity.
///
/// Reads of public entities skip the ownership half.
pub fn authorize(actor: &Actor, operation: Operation, scope: &Scope) -> Result<()> {
    let decision = if operation == Operation::Read && scope.public {
        Decision::Allow
    } else {
        permits(actor.role, operation).and_then(|| in_scope(actor, scope))
    };
    deny_logged(actor, operation, decision)
}

/// Ownership half only; used where the role check depends on the transition
/// being requested.
pub fn authorize_scope(actor: &Actor, operation: Operation, scope: &Scope) -> Result<()> {
    deny_logged(actor, operation, in_scope(actor, scope))
}

/// Gate for operations that do not target an existing entity.
pub fn authorize_role(actor: &Actor, operation: Operation) -> Result<()> {
    deny_logged(actor, operation, permits(actor.role, operation))
}

fn deny_logged(actor: &Actor, operation: Operation, decision: Decision) -> Result<()> {
    if let Decision::Deny(rule) = decision {
        tracing::warn!(actor = %actor, ?operation, rule = rule.as_str(), "request denied");
    }
    decision.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn owned_by(student: Uuid, company: Uuid, faculty: Option<Uuid>) -> Scope {
        Scope {
            student_id: Some(student),
            company_id: Some(company),
            faculty_id: faculty,
            public: false,
        }
    }

    fn rule_of(result: Result<()>) -> Rule {
        match result {
            Err(Error::Forbidden { rule }) => rule,
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn owners_see_their_own_records() {
        let (student, company, faculty) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let scope = owned_by(student, company, Some(faculty));

        assert!(can_read(&Actor::student(student), &scope));
        assert!(can_read(&Actor::company(company), &scope));
        assert!(can_read(&Actor::faculty(faculty), &scope));
        assert!(can_read(&Actor::scad(Uuid::new_v4()), &scope));
    }

    #[test]
    fn strangers_are_denied_with_named_rule() {
        let scope = owned_by(Uuid::new_v4(), Uuid::new_v4(), None);

        let rule = rule_of(authorize(&Actor::student(Uuid::new_v4()), Operation::Read, &scope));
        assert_eq!(rule, Rule::StudentOwnsEntity);
        let rule = rule_of(authorize(&Actor::company(Uuid::new_v4()), Operation::Read, &scope));
        assert_eq!(rule, Rule::CompanyOwnsEntity);
        let rule = rule_of(authorize(&Actor::faculty(Uuid::new_v4()), Operation::Read, &scope));
        assert_eq!(rule, Rule::FacultyAssigned);
    }

    #[test]
    fn scad_only_operations() {
        for op in [
            Operation::AssignFaculty,
            Operation::BlacklistCompany,
            Operation::ReviewCompany,
            Operation::ManageCycles,
            Operation::ReadAudit,
        ] {
            assert_ok!(authorize_role(&Actor::scad(Uuid::new_v4()), op));
            let rule = rule_of(authorize_role(&Actor::faculty(Uuid::new_v4()), op));
            assert_eq!(rule, Rule::ScadOnly);
        }
    }

    #[test]
    fn students_cannot_drive_applications() {
        let student = Uuid::new_v4();
        let scope = owned_by(student, Uuid::new_v4(), None);
        let rule = rule_of(authorize(
            &Actor::student(student),
            Operation::TransitionApplication,
            &scope,
        ));
        assert_eq!(rule, Rule::CompanyDrivesApplications);
    }

    #[test]
    fn public_scope_is_readable_but_not_writable() {
        let company = Uuid::new_v4();
        let scope = Scope {
            company_id: Some(company),
            public: true,
            ..Scope::default()
        };
        assert_ok!(authorize(&Actor::student(Uuid::new_v4()), Operation::Read, &scope));
        assert_err!(authorize(
            &Actor::company(Uuid::new_v4()),
            Operation::PostJob,
            &scope
        ));
        assert_ok!(authorize(&Actor::company(company), Operation::PostJob, &scope));
    }

    #[test]
    fn forbidden_names_rule_code() {
        let err = Error::forbidden(Rule::ScadOnly);
        assert_eq!(err.kind(), "forbidden");
        assert!(err.to_string().contains("scad_only"));
    }
}
