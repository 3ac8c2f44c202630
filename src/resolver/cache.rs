use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use super::DomainRecord;

/// Domain records keyed by lower-cased ASCII domain. Expired entries are
/// dropped when touched; concurrent writers for one key: last one wins.
#[derive(Debug, Default)]
pub(crate) struct DomainCache {
    entries: Mutex<HashMap<String, DomainRecord>>,
}

impl DomainCache {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, DomainRecord>> {
        // A panic while holding the lock cannot leave a half-written record.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self, key: &str, now: Instant) -> Option<DomainRecord> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some(record) if record.is_fresh(now) => Some(record.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn insert(&self, record: DomainRecord) {
        self.entries().insert(record.domain.clone(), record);
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    pub(crate) fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, record| record.is_fresh(now));
        before - entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }
}
