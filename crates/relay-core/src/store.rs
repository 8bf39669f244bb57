//! Subscription Record Store
//!
//! Keyed create/get/modify against a document store. The store owns ID
//! generation and timestamps, the way a hosted document database assigns
//! document keys and server timestamps.
//!
//! Records are never written back whole from a stale copy: every change
//! goes through `modify`, which reads and writes under one lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{BillingError, Result};
use crate::subscription::{NewSubscription, Subscription, SubscriptionId};

/// In-place change applied by `SubscriptionStore::modify`.
///
/// Returns `Ok(true)` if the record changed. An `Err` aborts the change and
/// leaves the stored record untouched.
pub type Mutation<'a> = Box<dyn FnOnce(&mut Subscription) -> Result<bool> + Send + 'a>;

/// Subscription storage trait
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Create a pending record under a freshly generated ID
    async fn create(&self, draft: NewSubscription) -> Result<Subscription>;
    
    /// Get a record by ID
    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>>;
    
    /// Atomically apply `change` to the current record and return the result.
    ///
    /// `updated_at` is refreshed only when the change reports a modification.
    /// Fails with `NotFound` if no record has this ID.
    async fn modify(&self, id: &SubscriptionId, change: Mutation<'_>) -> Result<Subscription>;
}

/// In-memory subscription store (for development and tests)
#[derive(Default)]
pub struct MemorySubscriptionStore {
    records: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
    
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn create(&self, draft: NewSubscription) -> Result<Subscription> {
        let mut records = self.records.write().await;
        
        let mut id = SubscriptionId::generate();
        while records.contains_key(&id) {
            id = SubscriptionId::generate();
        }
        
        let record = Subscription::pending(id.clone(), draft, Utc::now());
        records.insert(id, record.clone());
        Ok(record)
    }
    
    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        Ok(self.records.read().await.get(id).cloned())
    }
    
    async fn modify(&self, id: &SubscriptionId, change: Mutation<'_>) -> Result<Subscription> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(id)
            .ok_or_else(|| BillingError::NotFound(id.to_string()))?;
        
        let mut draft = stored.clone();
        if change(&mut draft)? {
            draft.id = stored.id.clone();
            draft.created_at = stored.created_at;
            draft.updated_at = Utc::now();
            *stored = draft;
        }
        Ok(stored.clone())
    }
}
