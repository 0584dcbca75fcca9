//! Cache module for storing provider ratings in memory
//!
//! This module provides a cache with one slot per provider and a fixed TTL
//! (time-to-live). A slot older than its TTL is never reported as fresh; the
//! last reading is still available for diagnostics.

mod manager;

pub use manager::{CacheStatus, RatingCache, SlotStatus, DEFAULT_TTL};
