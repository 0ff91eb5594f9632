//! Process-local cache backend with manually tracked write timestamps.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::port::{CacheStore, Clock};

/// Minimum clock time between two sweeps of expired entries.
const SWEEP_INTERVAL: chrono::Duration = chrono::Duration::seconds(60);

struct Entry {
    value: Vec<u8>,
    written_at: DateTime<Utc>,
    ttl: Duration,
}

impl Entry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return true;
        };
        now - self.written_at < ttl
    }
}

struct Entries {
    map: FxHashMap<String, Entry>,
    last_sweep: DateTime<Utc>,
}

impl Entries {
    /// Drops every stale entry once per [`SWEEP_INTERVAL`], so keys that are
    /// never read again do not accumulate.
    fn sweep_if_due(&mut self, now: DateTime<Utc>) {
        if now - self.last_sweep < SWEEP_INTERVAL {
            return;
        }
        self.map.retain(|_, entry| entry.is_fresh(now));
        self.last_sweep = now;
    }
}

pub struct InMemoryCacheStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<Entries>,
}

impl InMemoryCacheStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let last_sweep = clock.now();
        Self {
            clock,
            entries: RwLock::new(Entries {
                map: FxHashMap::default(),
                last_sweep,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.map.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        {
            let guard = self.entries.read().await;
            match guard.map.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_fresh(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // expired
        let mut guard = self.entries.write().await;
        if guard.map.get(key).is_some_and(|entry| !entry.is_fresh(now)) {
            guard.map.remove(key);
        }
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = self.clock.now();
        let entry = Entry {
            value,
            written_at: now,
            ttl,
        };
        let mut guard = self.entries.write().await;
        guard.sweep_if_due(now);
        guard.map.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.map.remove(key);
        Ok(())
    }
}
