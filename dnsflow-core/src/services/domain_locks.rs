//! Per-zone write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::utils::domain_name::normalize_zone;

/// One async mutex per zone name.
///
/// Every path that writes a domain's local records holds the zone's guard
/// for the duration of its local write phase. Provider calls happen
/// outside the guard.
#[derive(Default)]
pub struct DomainLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DomainLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, zone: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(normalize_zone(zone)).or_default())
        };
        lock.lock_owned().await
    }
}
