use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{actor::Actor, audit_log::AuditLog, entity::EntityType};
use crate::utils::time::SharedClock;

#[derive(Clone)]
pub struct AuditService {
    entries: Arc<RwLock<Vec<AuditLog>>>,
    clock: SharedClock,
}

impl AuditService {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    pub fn log(
        &self,
        actor: &Actor,
        action: &str,
        entity_type: EntityType,
        entity_id: Uuid,
        changes: Option<JsonValue>,
    ) -> AuditLog {
        let entry = AuditLog {
            id: Uuid::new_v4(),
            actor_id: actor.id,
            actor_role: actor.role,
            action: action.to_string(),
            entity_type,
            entity_id,
            changes,
            created_at: self.clock.now(),
        };
        tracing::debug!(actor = %actor, action, %entity_type, %entity_id, "audit");
        self.entries.write().push(entry.clone());
        entry
    }

    /// Newest first, optionally narrowed to one entity type or id.
    pub fn list(&self, entity_type: Option<EntityType>, entity_id: Option<Uuid>) -> Vec<AuditLog> {
        self.entries
            .read()
            .iter()
            .rev()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .filter(|e| entity_id.map_or(true, |id| e.entity_id == id))
            .cloned()
            .collect()
    }
}
