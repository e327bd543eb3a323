use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dto::cycle_dto::CreateCyclePayload;
use crate::error::{Error, Result};
use crate::models::{
    actor::Actor,
    cycle::{CycleStatus, SubmissionCycle},
    entity::EntityType,
};
use crate::services::{
    audit_service::AuditService,
    authorization::{self, Operation},
};
use crate::store::{Entry, EntityStore, Versioned};
use crate::utils::time::{today, SharedClock};

/// Administers submission cycles. At most one cycle is active at a time.
#[derive(Clone)]
pub struct CycleService {
    store: EntityStore,
    clock: SharedClock,
    audit: AuditService,
    activation: Arc<Mutex<()>>,
}

impl CycleService {
    pub fn new(store: EntityStore, clock: SharedClock, audit: AuditService) -> Self {
        Self {
            store,
            clock,
            audit,
            activation: Arc::new(Mutex::new(())),
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateCyclePayload,
    ) -> Result<Versioned<SubmissionCycle>> {
        authorization::authorize_role(actor, Operation::ManageCycles)?;

        let mut cycle = SubmissionCycle {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            start_date: payload.start_date,
            end_date: payload.end_date,
            status: CycleStatus::Closed,
            created_at: self.clock.now(),
        };

        let (_serial, displaced) = if payload.activate {
            let serial = self.activation.lock().await;
            ensure_not_ended(&cycle, today(self.clock.as_ref()))?;
            let displaced = self.lock_active(None).await?;
            (Some(serial), displaced)
        } else {
            (None, Vec::new())
        };

        if payload.activate {
            cycle.status = CycleStatus::Active;
        }
        let snapshot = serde_json::to_value(&cycle)?;
        let created = self.store.cycles.insert(cycle)?;
        self.audit.log(
            actor,
            "create_cycle",
            EntityType::Cycle,
            created.record.id,
            Some(snapshot),
        );
        self.close_displaced(actor, displaced);
        tracing::info!(
            cycle_id = %created.record.id,
            name = %created.record.name,
            status = %created.record.status,
            "cycle created"
        );
        Ok(created)
    }

    /// Opens a cycle and closes whichever other cycle is active.
    ///
    /// Every affected cycle is locked before the first write, so a failed or
    /// abandoned call leaves the previous active cycle in place.
    pub async fn activate(&self, actor: &Actor, id: Uuid) -> Result<Versioned<SubmissionCycle>> {
        authorization::authorize_role(actor, Operation::ManageCycles)?;
        let _serial = self.activation.lock().await;

        let entry = self.store.cycles.lock(id).await?;
        let mut cycle = entry.current().record;
        ensure_not_ended(&cycle, today(self.clock.as_ref()))?;
        let displaced = self.lock_active(Some(id)).await?;

        self.close_displaced(actor, displaced);
        cycle.status = CycleStatus::Active;
        let committed = entry.commit(cycle);
        self.audit
            .log(actor, "activate_cycle", EntityType::Cycle, id, None);
        tracing::info!(cycle_id = %id, "cycle activated");
        Ok(committed)
    }

    /// Locks every active cycle other than `except`.
    async fn lock_active(&self, except: Option<Uuid>) -> Result<Vec<Entry<SubmissionCycle>>> {
        let ids: Vec<Uuid> = self
            .store
            .cycles
            .all()
            .into_iter()
            .filter(|c| Some(c.record.id) != except && c.record.status == CycleStatus::Active)
            .map(|c| c.record.id)
            .collect();
        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            entries.push(self.store.cycles.lock(id).await?);
        }
        Ok(entries)
    }

    fn close_displaced(&self, actor: &Actor, displaced: Vec<Entry<SubmissionCycle>>) {
        for entry in displaced {
            let mut cycle = entry.current().record;
            if cycle.status != CycleStatus::Active {
                continue;
            }
            let id = cycle.id;
            cycle.status = CycleStatus::Closed;
            entry.commit(cycle);
            self.audit.log(actor, "close_cycle", EntityType::Cycle, id, None);
            tracing::info!(cycle_id = %id, "cycle closed by activation of another");
        }
    }

    pub async fn close(&self, actor: &Actor, id: Uuid) -> Result<Versioned<SubmissionCycle>> {
        authorization::authorize_role(actor, Operation::ManageCycles)?;
        let _serial = self.activation.lock().await;

        let entry = self.store.cycles.lock(id).await?;
        let mut cycle = entry.current().record;
        if cycle.status == CycleStatus::Closed {
            return Ok(entry.current());
        }
        cycle.status = CycleStatus::Closed;
        let committed = entry.commit(cycle);
        self.audit.log(actor, "close_cycle", EntityType::Cycle, id, None);
        tracing::info!(cycle_id = %id, "cycle closed");
        Ok(committed)
    }

    /// The cycle as it reads today: an active cycle past its end date is closed.
    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<Versioned<SubmissionCycle>> {
        authorization::authorize_role(actor, Operation::Read)?;
        let cycle = self.store.cycles.get(id)?;
        Ok(reported(cycle, today(self.clock.as_ref())))
    }
}

fn ensure_not_ended(cycle: &SubmissionCycle, today: chrono::NaiveDate) -> Result<()> {
    if cycle.has_ended(today) {
        return Err(Error::InvalidTransition {
            from: cycle.effective_status(today).to_string(),
            action: "activate".to_string(),
            allowed: Vec::new(),
            reason: Some(format!("cycle ended on {}", cycle.end_date)),
        });
    }
    Ok(())
}

pub fn reported(
    mut cycle: Versioned<SubmissionCycle>,
    today: chrono::NaiveDate,
) -> Versioned<SubmissionCycle> {
    cycle.record.status = cycle.record.effective_status(today);
    cycle
}
