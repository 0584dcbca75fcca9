//! Subscribable rating state for display
//!
//! A `RatingTracker` binds a pair of handles and fallback values to an
//! aggregator and publishes an [`AggregateState`] through a watch channel.
//! The state always carries a displayable rating per provider: the live value
//! when one arrived, the fallback otherwise.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::aggregator::{FetchReport, RatingAggregator};
use crate::data::Provider;

/// Fallback Codeforces rating shown when no live value is available
pub const DEFAULT_CODEFORCES_FALLBACK: u32 = 1564;

/// Fallback CodeChef rating shown when no live value is available
pub const DEFAULT_CODECHEF_FALLBACK: u32 = 1889;

/// A displayable rating per provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub codeforces: u32,
    pub codechef: u32,
}

impl Default for Ratings {
    fn default() -> Self {
        Self {
            codeforces: DEFAULT_CODEFORCES_FALLBACK,
            codechef: DEFAULT_CODECHEF_FALLBACK,
        }
    }
}

impl Ratings {
    pub fn get(&self, provider: Provider) -> u32 {
        match provider {
            Provider::Codeforces => self.codeforces,
            Provider::CodeChef => self.codechef,
        }
    }
}

/// Handles to track and the values to show when they cannot be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub codeforces_handle: String,
    pub codechef_handle: String,
    pub fallback: Ratings,
}

impl TrackerConfig {
    pub fn handle(&self, provider: Provider) -> &str {
        match provider {
            Provider::Codeforces => &self.codeforces_handle,
            Provider::CodeChef => &self.codechef_handle,
        }
    }
}

/// What the display layer renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateState {
    pub ratings: Ratings,
    /// A fetch cycle is in flight
    pub loading: bool,
    /// Last provider failure of the most recent cycle, for diagnostics only
    pub error: Option<String>,
    /// When the most recent cycle finished
    pub last_updated: Option<DateTime<Local>>,
}

impl AggregateState {
    /// State before the first cycle: loading, with fallbacks in place
    pub fn initial(fallback: Ratings) -> Self {
        Self {
            ratings: fallback,
            loading: true,
            error: None,
            last_updated: None,
        }
    }
}

/// Tracks ratings for one handle pair
///
/// Cycles start only from [`load`](Self::load) or [`refresh`](Self::refresh);
/// nothing polls in the background.
#[derive(Debug)]
pub struct RatingTracker {
    aggregator: Arc<RatingAggregator>,
    config: TrackerConfig,
    state: watch::Sender<AggregateState>,
}

impl RatingTracker {
    pub fn new(aggregator: Arc<RatingAggregator>, config: TrackerConfig) -> Self {
        let (state, _) = watch::channel(AggregateState::initial(config.fallback));
        Self {
            aggregator,
            config,
            state,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<RatingAggregator> {
        &self.aggregator
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AggregateState {
        self.state.borrow().clone()
    }

    /// Initial cycle, served from the cache where it is fresh
    pub async fn load(&self) -> AggregateState {
        self.run_cycle(false).await
    }

    /// Manual cycle that bypasses the cache
    pub async fn refresh(&self) -> AggregateState {
        self.run_cycle(true).await
    }

    async fn run_cycle(&self, force: bool) -> AggregateState {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let codeforces = &self.config.codeforces_handle;
        let codechef = &self.config.codechef_handle;
        let report = if force {
            self.aggregator.refresh_report(codeforces, codechef).await
        } else {
            self.aggregator.fetch_report(codeforces, codechef).await
        };

        let ratings = self.display_ratings(&report);
        let error = report.failures.last().map(|failure| failure.to_string());
        if error.is_some() {
            debug!(failures = report.failures.len(), "showing fallback ratings");
        }
        info!(
            codeforces = ratings.codeforces,
            codechef = ratings.codechef,
            "ratings updated"
        );

        self.state.send_modify(|state| {
            state.ratings = ratings;
            state.error = error;
            state.last_updated = Some(Local::now());
            state.loading = false;
        });

        self.state()
    }

    /// Live value when present and non-zero, fallback otherwise
    fn display_ratings(&self, report: &FetchReport) -> Ratings {
        let pick = |provider: Provider| {
            report
                .ratings
                .get(provider)
                .filter(|&rating| rating > 0)
                .unwrap_or_else(|| self.config.fallback.get(provider))
        };

        Ratings {
            codeforces: pick(Provider::Codeforces),
            codechef: pick(Provider::CodeChef),
        }
    }
}
