use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::entity::EntityType;

/// A storable entity keyed by its id.
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: EntityType;

    fn id(&self) -> Uuid;
}

/// A record together with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versioned<T> {
    pub version: u64,
    #[serde(flatten)]
    pub record: T,
}

struct Slot<T> {
    writer: Arc<Mutex<()>>,
    current: RwLock<Versioned<T>>,
    removed: AtomicBool,
}

/// Keyed storage for one entity type.
///
/// Readers take a snapshot without waiting on writers. Writers go through
/// [`Table::lock`], which serializes mutations of a single id and leaves other
/// ids untouched.
pub struct Table<T> {
    rows: Arc<RwLock<HashMap<Uuid, Arc<Slot<T>>>>>,
    lock_timeout: Duration,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<T: Record> Table<T> {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            lock_timeout,
        }
    }

    pub fn insert(&self, record: T) -> Result<Versioned<T>> {
        let id = record.id();
        let mut rows = self.rows.write();
        if rows.contains_key(&id) {
            return Err(Error::Internal(format!("{} {} already exists", T::KIND, id)));
        }
        let versioned = Versioned { version: 1, record };
        rows.insert(
            id,
            Arc::new(Slot {
                writer: Arc::new(Mutex::new(())),
                current: RwLock::new(versioned.clone()),
                removed: AtomicBool::new(false),
            }),
        );
        Ok(versioned)
    }

    pub fn find(&self, id: Uuid) -> Option<Versioned<T>> {
        self.rows.read().get(&id).map(|slot| slot.current.read().clone())
    }

    pub fn get(&self, id: Uuid) -> Result<Versioned<T>> {
        self.find(id)
            .ok_or_else(|| Error::NotFound(format!("{} {} not found", T::KIND, id)))
    }

    pub fn all(&self) -> Vec<Versioned<T>> {
        self.rows
            .read()
            .values()
            .map(|slot| slot.current.read().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Acquires exclusive write access to one record.
    ///
    /// Gives up after the configured lock timeout with a retryable
    /// `ConcurrentModification`.
    pub async fn lock(&self, id: Uuid) -> Result<Entry<T>> {
        let slot = self
            .rows
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} {} not found", T::KIND, id)))?;

        let guard = tokio::time::timeout(self.lock_timeout, Arc::clone(&slot.writer).lock_owned())
            .await
            .map_err(|_| Error::ConcurrentModification {
                entity: T::KIND,
                id,
                detail: format!(
                    "timed out after {}ms waiting for another update; retry",
                    self.lock_timeout.as_millis()
                ),
            })?;

        if slot.removed.load(Ordering::Acquire) {
            return Err(Error::NotFound(format!("{} {} not found", T::KIND, id)));
        }

        Ok(Entry {
            id,
            slot,
            rows: Arc::clone(&self.rows),
            _guard: guard,
        })
    }
}

/// Exclusive write access to one record. Dropping it without calling
/// [`Entry::commit`] or [`Entry::remove`] leaves the record untouched.
pub struct Entry<T> {
    id: Uuid,
    slot: Arc<Slot<T>>,
    rows: Arc<RwLock<HashMap<Uuid, Arc<Slot<T>>>>>,
    _guard: OwnedMutexGuard<()>,
}

impl<T: Record> Entry<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current(&self) -> Versioned<T> {
        self.slot.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.slot.current.read().version
    }

    /// Compare-and-swap precondition: fails when the caller acted on a stale read.
    pub fn check_version(&self, expected: Option<u64>) -> Result<()> {
        match expected {
            Some(expected) if expected != self.version() => Err(Error::ConcurrentModification {
                entity: T::KIND,
                id: self.id,
                detail: format!(
                    "expected version {} but found {}; refetch and retry",
                    expected,
                    self.version()
                ),
            }),
            _ => Ok(()),
        }
    }

    pub fn commit(self, record: T) -> Versioned<T> {
        let mut current = self.slot.current.write();
        current.version += 1;
        current.record = record;
        current.clone()
    }

    pub fn remove(self) -> T {
        self.slot.removed.store(true, Ordering::Release);
        self.rows.write().remove(&self.id);
        self.slot.current.read().record.clone()
    }
}
