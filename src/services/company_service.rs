use serde_json::json;
use uuid::Uuid;

use crate::dto::company_dto::{BlacklistPayload, RegisterCompanyPayload, ReviewCompanyPayload};
use crate::error::{Error, Result};
use crate::models::{
    actor::{Actor, Recipient, Role},
    company::{Company, CompanyDecision, CompanyStatus},
    entity::EntityType,
    event::{DomainEvent, EventKind},
};
use crate::services::{
    audit_service::AuditService,
    authorization::{self, Operation, Scoped},
    notification_service::NotificationService,
    transition::{self, COMPANY_TRANSITIONS},
};
use crate::store::{EntityStore, Versioned};
use crate::utils::time::SharedClock;

#[derive(Clone)]
pub struct CompanyService {
    store: EntityStore,
    clock: SharedClock,
    notifications: NotificationService,
    audit: AuditService,
}

impl CompanyService {
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

    /// Creates the profile managed by the calling company account. The
    /// profile shares the account's id.
    pub fn register(
        &self,
        actor: &Actor,
        payload: RegisterCompanyPayload,
    ) -> Result<Versioned<Company>> {
        authorization::authorize_role(actor, Operation::RegisterCompany)?;
        if self.store.companies.find(actor.id).is_some() {
            return Err(Error::BadRequest(format!(
                "company {} is already registered",
                actor.id
            )));
        }

        let now = self.clock.now();
        let company = Company {
            id: actor.id,
            name: payload.name.trim().to_string(),
            industry: payload.industry.trim().to_string(),
            size: payload.size,
            email: payload.email.trim().to_lowercase(),
            description: payload.description,
            status: CompanyStatus::Pending,
            blacklisted: false,
            blacklist_reason: None,
            registered_at: now,
            reviewed_at: None,
        };
        let created = self.store.companies.insert(company)?;

        tracing::info!(company_id = %created.record.id, name = %created.record.name, "company registered");
        self.notifications.publish(DomainEvent::new(
            EventKind::CompanyRegistered,
            Recipient::office(Role::Scad),
            EntityType::Company,
            created.record.id,
            format!("{} registered and awaits review", created.record.name),
            now,
        ));
        Ok(created)
    }

    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<Versioned<Company>> {
        let company = self.store.companies.get(id)?;
        authorization::authorize(actor, Operation::Read, &company.record.scope())?;
        Ok(company)
    }

    pub async fn review(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: ReviewCompanyPayload,
    ) -> Result<Versioned<Company>> {
        authorization::authorize_role(actor, Operation::ReviewCompany)?;

        let entry = self.store.companies.lock(id).await?;
        entry.check_version(payload.expected_version)?;
        let mut company = entry.current().record;
        let from = company.status;
        let step = transition::validate(COMPANY_TRANSITIONS, from, payload.decision)?;

        let now = self.clock.now();
        company.status = step.to;
        company.reviewed_at = Some(now);
        let committed = entry.commit(company);

        self.audit.log(
            actor,
            "review_company",
            EntityType::Company,
            id,
            Some(json!({ "from": from, "to": step.to, "note": payload.note })),
        );
        tracing::info!(company_id = %id, decision = %payload.decision, "company reviewed");

        let (kind, message) = match payload.decision {
            CompanyDecision::Approve => (
                EventKind::CompanyApproved,
                "Your company registration was approved",
            ),
            CompanyDecision::Reject => (
                EventKind::CompanyRejected,
                "Your company registration was rejected",
            ),
        };
        self.notifications.publish(
            DomainEvent::new(
                kind,
                Recipient::user(Actor::company(id)),
                EntityType::Company,
                id,
                message,
                now,
            )
            .with_note(payload.note),
        );
        Ok(committed)
    }

    /// Blacklisting requires a non-empty reason; lifting it clears the reason.
    pub async fn set_blacklist(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: BlacklistPayload,
    ) -> Result<Versioned<Company>> {
        authorization::authorize_role(actor, Operation::BlacklistCompany)?;

        let entry = self.store.companies.lock(id).await?;
        entry.check_version(payload.expected_version)?;
        let mut company = entry.current().record;

        let reason = payload
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if payload.blacklisted && reason.is_none() {
            return Err(Error::MissingReason(
                "blacklisting a company requires a reason".to_string(),
            ));
        }

        let was_blacklisted = company.blacklisted;
        company.blacklisted = payload.blacklisted;
        company.blacklist_reason = if payload.blacklisted { reason.clone() } else { None };
        let committed = entry.commit(company);

        self.audit.log(
            actor,
            if payload.blacklisted {
                "blacklist_company"
            } else {
                "reinstate_company"
            },
            EntityType::Company,
            id,
            Some(json!({
                "from": was_blacklisted,
                "to": payload.blacklisted,
                "reason": reason,
            })),
        );
        tracing::info!(company_id = %id, blacklisted = payload.blacklisted, "company blacklist updated");

        let (kind, message) = if payload.blacklisted {
            (
                EventKind::CompanyBlacklisted,
                "Your company has been blacklisted",
            )
        } else {
            (
                EventKind::CompanyReinstated,
                "Your company has been removed from the blacklist",
            )
        };
        self.notifications.publish(
            DomainEvent::new(
                kind,
                Recipient::user(Actor::company(id)),
                EntityType::Company,
                id,
                message,
                self.clock.now(),
            )
            .with_note(reason),
        );
        Ok(committed)
    }
}
