//! Rating aggregation across both providers
//!
//! Checks the cache per provider, fetches the misses concurrently and stores
//! every successful reading. Failures never escape: a provider that could not
//! be reached contributes `None` plus a [`ProviderFailure`] in the report.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheStatus, RatingCache};
use crate::data::{FetchError, ProbeResult, Provider, ProviderClient, ProviderReading, RatingPair};

/// A provider that could not deliver a rating in one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: Provider,
    pub message: String,
}

impl ProviderFailure {
    fn new(provider: Provider, error: &FetchError) -> Self {
        Self {
            provider,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

/// Ratings from one aggregation cycle plus whatever went wrong
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub ratings: RatingPair,
    /// Failures in provider order; empty when every slot was filled
    pub failures: Vec<ProviderFailure>,
    /// Number of HTTP requests issued (cache hits excluded)
    pub requests: usize,
}

/// Produces best-effort current ratings for Codeforces and CodeChef
///
/// Owns its cache, so every aggregator starts cold. Share one instance
/// behind an `Arc`.
#[derive(Debug)]
pub struct RatingAggregator {
    client: ProviderClient,
    cache: RatingCache,
    /// Serializes manual refreshes
    refresh_lock: tokio::sync::Mutex<()>,
    /// Bumped after every completed refresh
    refresh_generation: AtomicU64,
    last_refresh: Mutex<Option<CompletedRefresh>>,
    cancel: CancellationToken,
}

/// The most recent refresh and the handles it was issued for
#[derive(Debug, Clone)]
struct CompletedRefresh {
    codeforces_handle: String,
    codechef_handle: String,
    report: FetchReport,
}

impl Default for RatingAggregator {
    fn default() -> Self {
        Self::new(ProviderClient::new(), RatingCache::new())
    }
}

impl RatingAggregator {
    pub fn new(client: ProviderClient, cache: RatingCache) -> Self {
        Self {
            client,
            cache,
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
            last_refresh: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cache(&self) -> &RatingCache {
        &self.cache
    }

    /// Issues one request for `handle`; every failure becomes `None`
    pub async fn fetch_rating(&self, provider: Provider, handle: &str) -> Option<u32> {
        match self.client.try_fetch(provider, handle, &self.cancel).await {
            Ok(rating) => Some(rating),
            Err(e) => {
                warn!(%provider, handle, error = %e, "error fetching rating");
                None
            }
        }
    }

    /// Returns the provider's cached rating while it is younger than the TTL
    pub fn get_cached(&self, provider: Provider) -> Option<u32> {
        self.cache.get(provider)
    }

    /// Returns both ratings, fetching only the providers that missed the cache
    pub async fn get_both_ratings(&self, codeforces_handle: &str, codechef_handle: &str) -> RatingPair {
        self.fetch_report(codeforces_handle, codechef_handle)
            .await
            .ratings
    }

    /// Like [`get_both_ratings`](Self::get_both_ratings), keeping the failures
    pub async fn fetch_report(&self, codeforces_handle: &str, codechef_handle: &str) -> FetchReport {
        self.collect(codeforces_handle, codechef_handle, false).await
    }

    /// Bypasses the cache and fetches both ratings again
    pub async fn refresh(&self, codeforces_handle: &str, codechef_handle: &str) -> RatingPair {
        self.refresh_report(codeforces_handle, codechef_handle)
            .await
            .ratings
    }

    /// Forced fetch of both providers
    ///
    /// A refresh that waited behind another one for the same handles returns
    /// that refresh's report instead of sending its own requests.
    pub async fn refresh_report(&self, codeforces_handle: &str, codechef_handle: &str) -> FetchReport {
        let seen = self.refresh_generation.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        if self.refresh_generation.load(Ordering::Acquire) != seen {
            if let Some(report) = self.last_refresh_for(codeforces_handle, codechef_handle) {
                debug!("refresh completed while waiting, reusing its result");
                return report;
            }
        }

        info!("refreshing ratings");
        self.cache.invalidate_all();
        let report = self.collect(codeforces_handle, codechef_handle, true).await;

        *self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(CompletedRefresh {
            codeforces_handle: codeforces_handle.to_string(),
            codechef_handle: codechef_handle.to_string(),
            report: report.clone(),
        });
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);

        report
    }

    /// Report of the last refresh, if it was issued for these handles
    fn last_refresh_for(&self, codeforces_handle: &str, codechef_handle: &str) -> Option<FetchReport> {
        let last = self.last_refresh.lock().unwrap_or_else(PoisonError::into_inner);
        last.as_ref()
            .filter(|done| {
                done.codeforces_handle == codeforces_handle && done.codechef_handle == codechef_handle
            })
            .map(|done| done.report.clone())
    }

    async fn collect(&self, codeforces_handle: &str, codechef_handle: &str, force: bool) -> FetchReport {
        let (codeforces, codechef) = future::join(
            self.lookup(Provider::Codeforces, codeforces_handle, force),
            self.lookup(Provider::CodeChef, codechef_handle, force),
        )
        .await;

        let mut report = FetchReport::default();
        for (provider, outcome) in [
            (Provider::Codeforces, codeforces),
            (Provider::CodeChef, codechef),
        ] {
            if outcome.requested {
                report.requests += 1;
            }
            match outcome.result {
                Ok(rating) => report.ratings.set(provider, Some(rating)),
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    async fn lookup(&self, provider: Provider, handle: &str, force: bool) -> LookupOutcome {
        if !force {
            if let Some(rating) = self.cache.get_for(provider, handle) {
                debug!(%provider, handle, rating, "cache hit");
                return LookupOutcome {
                    requested: false,
                    result: Ok(rating),
                };
            }
        }

        let result = match self.client.try_fetch(provider, handle, &self.cancel).await {
            Ok(rating) => {
                self.cache.put(ProviderReading::new(provider, handle, rating));
                Ok(rating)
            }
            Err(e) => {
                warn!(%provider, handle, error = %e, "error fetching rating");
                Err(ProviderFailure::new(provider, &e))
            }
        };

        LookupOutcome {
            requested: true,
            result,
        }
    }

    /// Cache diagnostics for both providers
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    /// Checks both endpoints directly, ignoring the cache
    pub async fn probe(&self, codeforces_handle: &str, codechef_handle: &str) -> Vec<ProbeResult> {
        let (codeforces, codechef) = future::join(
            self.client.probe(Provider::Codeforces, codeforces_handle),
            self.client.probe(Provider::CodeChef, codechef_handle),
        )
        .await;
        vec![codeforces, codechef]
    }

    /// Token observed by every request this aggregator issues
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels in-flight and future requests; they fall back like any failure
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

struct LookupOutcome {
    requested: bool,
    result: Result<u32, ProviderFailure>,
}
