//! cpratings library
//!
//! Fetches Codeforces and CodeChef ratings concurrently, caches each for a
//! fixed window and falls back to caller-supplied values on any failure.

pub mod aggregator;
pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod tracker;
pub mod ui;

pub use aggregator::{FetchReport, ProviderFailure, RatingAggregator};
pub use cache::RatingCache;
pub use data::{FetchError, Provider, ProviderClient, RatingPair};
pub use tracker::{AggregateState, Ratings, RatingTracker, TrackerConfig};
