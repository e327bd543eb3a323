//! Read side used by list endpoints and dashboards.
//!
//! Every list is first narrowed to what the caller may see, then filtered,
//! then ordered by date (newest first) with ties broken by ascending id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dto::list_dto::{ListQuery, Page};
use crate::error::Result;
use crate::models::{
    actor::{Actor, Role},
    application::Application,
    company::{Company, CompanyStatus},
    cycle::SubmissionCycle,
    entity::EntityType,
    evaluation::Evaluation,
    job::Job,
    submission::Submission,
};
use crate::services::{
    authorization::{self, can_read, Operation, Scoped},
    cycle_service::reported,
    job_service::job_visible,
};
use crate::store::{EntityStore, Record, Versioned};
use crate::utils::time::{today, SharedClock};

pub trait Listing: Record + Scoped {
    fn status_label(&self) -> &'static str;

    fn listed_at(&self) -> DateTime<Utc>;

    /// Fields matched by the free-text `search` filter.
    fn search_fields(&self) -> Vec<&str>;

    /// `Some` only for entities that can be assigned to a reviewer.
    fn is_assigned(&self) -> Option<bool> {
        None
    }
}

impl Listing for Submission {
    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.submission_date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.student_name.as_str(),
            self.company.company_name.as_str(),
            self.company.supervisor_name.as_str(),
        ]
    }

    fn is_assigned(&self) -> Option<bool> {
        Some(self.faculty_assigned.is_some())
    }
}

impl Listing for Application {
    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.applied_date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.student_name.as_str(),
            self.company_name.as_str(),
            self.job_title.as_str(),
        ]
    }
}

impl Listing for Company {
    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.industry.as_str()]
    }
}

impl Listing for Job {
    fn status_label(&self) -> &'static str {
        if self.paid {
            "paid"
        } else {
            "unpaid"
        }
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.company_name.as_str()];
        fields.extend(self.skills.iter().map(String::as_str));
        fields
    }
}

impl Listing for Evaluation {
    fn status_label(&self) -> &'static str {
        "submitted"
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.submitted_date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.student_name.as_str(), self.job_title.as_str()]
    }
}

impl Listing for SubmissionCycle {
    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

fn matches<T: Listing>(record: &T, query: &ListQuery) -> bool {
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        if !record.status_label().eq_ignore_ascii_case(status) {
            return false;
        }
    }
    if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = needle.to_lowercase();
        if !record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    let day = record.listed_at().date_naive();
    if query.from.map_or(false, |from| day < from) || query.to.map_or(false, |to| day > to) {
        return false;
    }
    match (query.assigned, record.is_assigned()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    }
}

/// Scope, filter and order `rows` for `actor`.
pub fn select<T: Listing>(
    actor: &Actor,
    rows: Vec<Versioned<T>>,
    query: &ListQuery,
    visible: impl Fn(&T) -> bool,
) -> Vec<Versioned<T>> {
    let mut selected: Vec<Versioned<T>> = rows
        .into_iter()
        .filter(|row| can_read(actor, &row.record.scope()) && visible(&row.record))
        .filter(|row| matches(&row.record, query))
        .collect();
    selected.sort_by(|a, b| {
        b.record
            .listed_at()
            .cmp(&a.record.listed_at())
            .then_with(|| a.record.id().cmp(&b.record.id()))
    });
    selected
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EntityList {
    Submissions(Page<Versioned<Submission>>),
    Applications(Page<Versioned<Application>>),
    Companies(Page<Versioned<Company>>),
    Jobs(Page<Versioned<Job>>),
    Evaluations(Page<Versioned<Evaluation>>),
    Cycles(Page<Versioned<SubmissionCycle>>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub submissions: BTreeMap<&'static str, usize>,
    pub applications: BTreeMap<&'static str, usize>,
    /// Only reported to SCAD.
    pub unassigned_submissions: Option<usize>,
    pub companies_pending_review: Option<usize>,
}

#[derive(Clone)]
pub struct QueryService {
    store: EntityStore,
    clock: SharedClock,
}

impl QueryService {
    pub fn new(store: EntityStore, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub fn submissions(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<Submission>> {
        select(actor, self.store.submissions.all(), query, |_| true)
    }

    pub fn applications(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<Application>> {
        select(actor, self.store.applications.all(), query, |_| true)
    }

    pub fn companies(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<Company>> {
        select(actor, self.store.companies.all(), query, |_| true)
    }

    pub fn jobs(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<Job>> {
        select(actor, self.store.jobs.all(), query, |job| {
            job_visible(&self.store, actor, job)
        })
    }

    pub fn evaluations(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<Evaluation>> {
        select(actor, self.store.evaluations.all(), query, |_| true)
    }

    pub fn cycles(&self, actor: &Actor, query: &ListQuery) -> Vec<Versioned<SubmissionCycle>> {
        let today = today(self.clock.as_ref());
        let rows = self
            .store
            .cycles
            .all()
            .into_iter()
            .map(|c| reported(c, today))
            .collect();
        select(actor, rows, query, |_| true)
    }

    /// One paginated, role-scoped list of any entity type.
    pub fn list_entities(
        &self,
        actor: &Actor,
        entity_type: EntityType,
        query: &ListQuery,
    ) -> Result<EntityList> {
        authorization::authorize_role(actor, Operation::Read)?;
        let list = match entity_type {
            EntityType::Submission => {
                EntityList::Submissions(Page::paginate(self.submissions(actor, query), query))
            }
            EntityType::Application => {
                EntityList::Applications(Page::paginate(self.applications(actor, query), query))
            }
            EntityType::Company => {
                EntityList::Companies(Page::paginate(self.companies(actor, query), query))
            }
            EntityType::Job => EntityList::Jobs(Page::paginate(self.jobs(actor, query), query)),
            EntityType::Evaluation => {
                EntityList::Evaluations(Page::paginate(self.evaluations(actor, query), query))
            }
            EntityType::Cycle => {
                EntityList::Cycles(Page::paginate(self.cycles(actor, query), query))
            }
        };
        Ok(list)
    }

    pub fn stats(&self, actor: &Actor) -> DashboardStats {
        let everything = ListQuery::default();
        let submissions = self.submissions(actor, &everything);
        let applications = self.applications(actor, &everything);

        let mut stats = DashboardStats::default();
        for s in &submissions {
            *stats.submissions.entry(s.record.status_label()).or_default() += 1;
        }
        for a in &applications {
            *stats.applications.entry(a.record.status_label()).or_default() += 1;
        }
        if actor.role == Role::Scad {
            stats.unassigned_submissions = Some(
                submissions
                    .iter()
                    .filter(|s| {
                        s.record.faculty_assigned.is_none() && !s.record.status.is_terminal()
                    })
                    .count(),
            );
            stats.companies_pending_review = Some(
                self.store
                    .companies
                    .all()
                    .iter()
                    .filter(|c| c.record.status == CompanyStatus::Pending)
                    .count(),
            );
        }
        stats
    }
}
