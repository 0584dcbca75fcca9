//! In-memory rating cache
//!
//! Provides a `RatingCache` that holds the last reading per provider together
//! with the monotonic instant it was stored, so freshness is immune to wall
//! clock changes.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use crate::data::{Provider, ProviderReading};

/// Time-to-live for cached ratings
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A stored reading plus the instant it entered the cache
#[derive(Debug, Clone)]
struct CacheSlot {
    reading: ProviderReading,
    stored_at: Instant,
}

/// Per-provider cache diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    /// Whether a reading has ever been stored
    pub cached: bool,
    /// Whether the reading is still within the TTL
    pub fresh: bool,
    /// Milliseconds since the reading was stored
    pub age_ms: Option<u64>,
    pub handle: Option<String>,
    pub rating: Option<u32>,
}

/// Cache diagnostics for both providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub codeforces: SlotStatus,
    pub codechef: SlotStatus,
}

/// Holds the most recent rating per provider
///
/// One slot per provider. A slot is created on the first successful fetch,
/// overwritten by every later one, and lives as long as the cache.
#[derive(Debug)]
pub struct RatingCache {
    slots: Mutex<HashMap<Provider, CacheSlot>>,
    ttl: Duration,
}

impl Default for RatingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingCache {
    /// Creates a cache with the default five minute TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Provider, CacheSlot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, slot: &CacheSlot) -> bool {
        slot.stored_at.elapsed() < self.ttl
    }

    /// Returns the cached rating for `provider` if it is younger than the TTL
    pub fn get(&self, provider: Provider) -> Option<u32> {
        let slots = self.slots();
        let slot = slots.get(&provider)?;
        self.is_fresh(slot).then_some(slot.reading.rating)
    }

    /// Like [`get`](Self::get), but a slot filled for a different handle is a miss
    pub fn get_for(&self, provider: Provider, handle: &str) -> Option<u32> {
        let slots = self.slots();
        let slot = slots.get(&provider)?;
        if slot.reading.handle != handle {
            trace!(%provider, cached = %slot.reading.handle, handle, "cached handle differs");
            return None;
        }
        self.is_fresh(slot).then_some(slot.reading.rating)
    }

    /// Stores `reading`, replacing whatever the provider's slot held
    pub fn put(&self, reading: ProviderReading) {
        let slot = CacheSlot {
            reading,
            stored_at: Instant::now(),
        };
        self.slots().insert(slot.reading.provider, slot);
    }

    /// Marks the provider's slot as stale
    pub fn invalidate(&self, provider: Provider) {
        self.slots().remove(&provider);
    }

    pub fn invalidate_all(&self) {
        self.slots().clear();
    }

    /// Reports what each slot holds and how old it is
    pub fn status(&self) -> CacheStatus {
        let slots = self.slots();
        let slot_status = |provider: Provider| match slots.get(&provider) {
            None => SlotStatus::default(),
            Some(slot) => SlotStatus {
                cached: true,
                fresh: self.is_fresh(slot),
                age_ms: Some(
                    u64::try_from(slot.stored_at.elapsed().as_millis()).unwrap_or(u64::MAX),
                ),
                handle: Some(slot.reading.handle.clone()),
                rating: Some(slot.reading.rating),
            },
        };

        CacheStatus {
            codeforces: slot_status(Provider::Codeforces),
            codechef: slot_status(Provider::CodeChef),
        }
    }
}
