//! Inventory lock table.
//!
//! Serializes stock read-modify-write cycles per product id. A checkout
//! leases every id in its cart at once; keys are sorted and de-duplicated
//! before locking, so two carts that overlap always lock in the same order
//! and cannot deadlock. Entries are removed once nobody holds or waits on
//! them, keeping the table proportional to in-flight checkouts.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::observability::metrics;

/// Key used in global mode: every checkout contends on this one entry.
pub const GLOBAL_KEY: &str = "*";

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Process-wide table of per-product locks.
#[derive(Clone, Default)]
pub struct InventoryLocks {
    table: Arc<LockTable>,
}

impl InventoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until every key is held by this caller.
    pub async fn acquire<I, S>(&self, keys: I) -> InventoryLease
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        let start = Instant::now();
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            // The shard lock is released at the end of this statement, before
            // the await below.
            let mutex = Arc::clone(
                self.table
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .value(),
            );
            guards.push(mutex.lock_owned().await);
        }
        metrics::record_lock_wait(start.elapsed());

        InventoryLease {
            table: Arc::clone(&self.table),
            keys,
            guards,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.table.len()
    }
}

/// Held locks for one checkout. Dropping the lease releases them.
pub struct InventoryLease {
    table: Arc<LockTable>,
    keys: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl InventoryLease {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for InventoryLease {
    fn drop(&mut self) {
        self.guards.clear();
        for key in &self.keys {
            // Clones are only taken under the shard lock, so a count of one
            // means no other task holds or waits on this entry.
            self.table
                .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

impl std::fmt::Debug for InventoryLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLease").field("keys", &self.keys).finish()
    }
}
