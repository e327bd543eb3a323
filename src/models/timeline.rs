use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::{Actor, Role};

/// One append-only history record. `action = None` marks creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry<S, A> {
    pub timestamp: DateTime<Utc>,
    pub actor_role: Role,
    pub actor_id: Uuid,
    pub action: Option<A>,
    pub from: Option<S>,
    pub to: S,
    pub note: Option<String>,
}

impl<S, A> TimelineEntry<S, A> {
    pub fn created(actor: &Actor, at: DateTime<Utc>, status: S) -> Self {
        Self {
            timestamp: at,
            actor_role: actor.role,
            actor_id: actor.id,
            action: None,
            from: None,
            to: status,
            note: None,
        }
    }

    pub fn transition(
        actor: &Actor,
        at: DateTime<Utc>,
        action: A,
        from: S,
        to: S,
        note: Option<String>,
    ) -> Self {
        Self {
            timestamp: at,
            actor_role: actor.role,
            actor_id: actor.id,
            action: Some(action),
            from: Some(from),
            to,
            note,
        }
    }
}
