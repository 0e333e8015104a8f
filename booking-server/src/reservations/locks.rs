//! Per-table write serialization
//!
//! Every read-check-write sequence on a table's schedule (create, update,
//! status transition, reconcile) runs under that table's async mutex, so two
//! concurrent creates for the same table/time window cannot both pass the
//! overlap check. Lock granularity is the table id; operations on different
//! tables never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct TableLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for one table.
    pub async fn lock(&self, table_id: i64) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(table_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Acquire locks for two tables in id order (reservation moves).
    ///
    /// Ordered acquisition keeps concurrent movers from deadlocking.
    pub async fn lock_pair(
        &self,
        a: i64,
        b: i64,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if a == b {
            return (self.lock(a).await, None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_guard = self.lock(first).await;
        let second_guard = self.lock(second).await;
        (first_guard, Some(second_guard))
    }
}
