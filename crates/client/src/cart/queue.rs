use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::transactions::SalePayload;
use crate::storage::{KeyValueStore, StorageError, keys, load_json, save_json};

/// A sale captured while the terminal was offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSale {
    /// Local reference; the backend never sees it.
    pub client_ref: Uuid,
    pub queued_at: DateTime<Utc>,
    pub sale: SalePayload,
}

/// Sales waiting to be submitted, oldest first.
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<QueuedSale>,
}

impl std::fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineQueue")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl OfflineQueue {
    /// Load the persisted queue, or start empty.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let entries = load_json(store.as_ref(), keys::OFFLINE_QUEUE)?.unwrap_or_default();
        Ok(Self { store, entries })
    }

    /// Append a sale.
    ///
    /// # Errors
    ///
    /// Returns error if the queue cannot be persisted. The sale is not kept
    /// in that case.
    pub fn push(&mut self, sale: SalePayload) -> Result<Uuid, StorageError> {
        let entry = QueuedSale {
            client_ref: Uuid::new_v4(),
            queued_at: Utc::now(),
            sale,
        };
        let client_ref = entry.client_ref;
        self.entries.push(entry);
        if let Err(e) = self.persist() {
            self.entries.pop();
            return Err(e);
        }
        info!(%client_ref, pending = self.entries.len(), "Sale queued offline");
        Ok(client_ref)
    }

    #[must_use]
    pub fn entries(&self) -> &[QueuedSale] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop a queued sale. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns error if the queue cannot be persisted.
    pub fn remove(&mut self, client_ref: Uuid) -> Result<bool, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.client_ref != client_ref);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), StorageError> {
        save_json(self.store.as_ref(), keys::OFFLINE_QUEUE, &self.entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use radapos_core::{EventId, Money, PaymentMethod, VendorId};

    use super::*;
    use crate::storage::MemoryStore;

    fn sale(amount: i64) -> SalePayload {
        SalePayload {
            vendor_id: VendorId::new(1),
            event_id: EventId::new(2),
            items: Vec::new(),
            amount_tendered: Money::from_shillings(amount),
            payment_method: PaymentMethod::Cash,
            offline: true,
        }
    }

    #[test]
    fn test_queue_keeps_order_across_reopen() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = OfflineQueue::open(store.clone()).unwrap();
        let first = queue.push(sale(100)).unwrap();
        let second = queue.push(sale(200)).unwrap();
        assert_ne!(first, second);

        let reopened = OfflineQueue::open(store).unwrap();
        let refs: Vec<Uuid> = reopened.entries().iter().map(|e| e.client_ref).collect();
        assert_eq!(refs, vec![first, second]);
    }

    #[test]
    fn test_remove() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = OfflineQueue::open(store.clone()).unwrap();
        let id = queue.push(sale(50)).unwrap();
        assert!(queue.remove(id).unwrap());
        assert!(!queue.remove(id).unwrap());
        assert!(OfflineQueue::open(store).unwrap().is_empty());
    }
}
