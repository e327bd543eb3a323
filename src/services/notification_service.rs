use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    actor::Actor,
    event::DomainEvent,
    notification::{DeliveryStatus, Notification},
};
use crate::utils::time::SharedClock;

/// Outbox for domain events.
///
/// Every event lands in its recipient's inbox. When a webhook target is
/// configured the event is also queued for delivery to the messaging
/// collaborator and retried with exponential back-off.
#[derive(Default)]
struct Outbox {
    /// Awaiting webhook delivery (pending or sending).
    queue: HashMap<Uuid, Notification>,
    /// Inbox-only, delivered, or out of attempts.
    settled: Vec<Notification>,
}

impl Outbox {
    fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.settled.iter().chain(self.queue.values())
    }
}

fn is_settled(n: &Notification) -> bool {
    match n.status {
        DeliveryStatus::InboxOnly | DeliveryStatus::Delivered => true,
        DeliveryStatus::Failed => n.attempts >= n.max_attempts,
        DeliveryStatus::Pending | DeliveryStatus::Sending => false,
    }
}

#[derive(Clone)]
pub struct NotificationService {
    outbox: Arc<RwLock<Outbox>>,
    client: Client,
    target_url: Option<String>,
    webhook_secret: String,
    max_attempts: u32,
    clock: SharedClock,
}

/// Delay before retry number `attempts`: 30s doubling per attempt, capped at an hour.
pub fn retry_delay(attempts: u32) -> Duration {
    let exponent = attempts.saturating_sub(1).min(16);
    let secs = 30_i64.saturating_mul(1_i64 << exponent);
    Duration::seconds(secs.min(3600))
}

impl NotificationService {
    pub fn new(config: &Config, clock: SharedClock) -> Self {
        Self {
            outbox: Arc::new(RwLock::new(Outbox::default())),
            client: Client::new(),
            target_url: config.notification_webhook_url.clone(),
            webhook_secret: config.webhook_secret.clone(),
            max_attempts: config.max_delivery_attempts.max(1),
            clock,
        }
    }

    pub fn publish(&self, event: DomainEvent) -> Notification {
        let now = self.clock.now();
        let status = if self.target_url.is_some() {
            DeliveryStatus::Pending
        } else {
            DeliveryStatus::InboxOnly
        };
        tracing::info!(
            event_id = %event.id,
            kind = ?event.kind,
            entity_id = %event.entity_id,
            ?status,
            "domain event published"
        );
        let notification = Notification {
            id: Uuid::new_v4(),
            event,
            status,
            attempts: 0,
            max_attempts: self.max_attempts,
            next_retry_at: None,
            http_status: None,
            response_body: None,
            created_at: now,
            updated_at: now,
        };
        let mut outbox = self.outbox.write();
        if is_settled(&notification) {
            outbox.settled.push(notification.clone());
        } else {
            outbox.queue.insert(notification.id, notification.clone());
        }
        notification
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Events addressed to `actor`, newest first.
    pub fn inbox(&self, actor: &Actor) -> Vec<DomainEvent> {
        let mut events: Vec<DomainEvent> = self
            .outbox
            .read()
            .iter()
            .filter(|n| n.event.recipient.matches(actor))
            .map(|n| n.event.clone())
            .collect();
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(a.id.cmp(&b.id)));
        events
    }

    pub fn get(&self, id: Uuid) -> Result<Notification> {
        let outbox = self.outbox.read();
        outbox
            .queue
            .get(&id)
            .or_else(|| outbox.settled.iter().find(|n| n.id == id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("notification {} not found", id)))
    }

    /// Every notification, oldest first.
    pub fn all(&self) -> Vec<Notification> {
        let mut all: Vec<Notification> = self.outbox.read().iter().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Notifications still waiting for webhook delivery.
    pub fn pending_count(&self) -> usize {
        self.outbox.read().queue.len()
    }

    /// Applies `apply` to a queued notification and moves it out of the
    /// queue once it needs no further delivery.
    fn update(&self, id: Uuid, apply: impl FnOnce(&mut Notification)) {
        let mut outbox = self.outbox.write();
        let Some(n) = outbox.queue.get_mut(&id) else {
            return;
        };
        apply(n);
        if is_settled(n) {
            if let Some(done) = outbox.queue.remove(&id) {
                outbox.settled.push(done);
            }
        }
    }

    /// Claims the oldest pending notification whose retry time has come.
    fn claim_due(&self, now: DateTime<Utc>) -> Option<Notification> {
        let mut outbox = self.outbox.write();
        let next = outbox
            .queue
            .values_mut()
            .filter(|n| n.status == DeliveryStatus::Pending)
            .filter(|n| n.next_retry_at.map_or(true, |at| at <= now))
            .min_by_key(|n| (n.created_at, n.id))?;
        next.status = DeliveryStatus::Sending;
        next.updated_at = now;
        Some(next.clone())
    }

    pub async fn deliver_once(&self, id: Uuid) -> Result<()> {
        let notification = self.get(id)?;
        let Some(target_url) = self.target_url.as_deref() else {
            return Ok(());
        };

        let res = self
            .client
            .post(target_url)
            .header("X-Webhook-Secret", &self.webhook_secret)
            .json(&notification.event)
            .send()
            .await;

        let now = self.clock.now();
        match res {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                self.update(id, |n| {
                    n.attempts += 1;
                    n.http_status = Some(status.as_u16());
                    n.response_body = Some(body);
                    n.status = if status.is_success() {
                        DeliveryStatus::Delivered
                    } else {
                        DeliveryStatus::Failed
                    };
                    n.updated_at = now;
                });
                tracing::info!(notification_id = %id, http_status = status.as_u16(), "webhook delivered");
            }
            Err(err) => {
                tracing::warn!(notification_id = %id, error = %err, "webhook delivery failed");
                self.update(id, |n| {
                    n.attempts += 1;
                    n.response_body = Some(err.to_string());
                    n.status = DeliveryStatus::Failed;
                    n.updated_at = now;
                });
            }
        }
        Ok(())
    }

    /// Delivers one due notification. Returns `false` when nothing was due.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(claimed) = self.claim_due(self.clock.now()) else {
            return Ok(false);
        };

        if let Err(e) = self.deliver_once(claimed.id).await {
            tracing::error!(notification_id = %claimed.id, error = %e, "webhook worker error");
        }

        let now = self.clock.now();
        self.update(claimed.id, |n| {
            if n.status == DeliveryStatus::Failed && n.attempts < n.max_attempts {
                n.status = DeliveryStatus::Pending;
                n.next_retry_at = Some(now + retry_delay(n.attempts));
            }
        });
        Ok(true)
    }
}
