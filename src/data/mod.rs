//! Core data models for cpratings
//!
//! This module contains the provider variant that selects the per-provider
//! adapter (URL builder and response parser), the reading type stored in the
//! cache, and the rating pair returned by the aggregator.

pub mod client;
pub mod codechef;
pub mod codeforces;

pub use client::{FetchError, ProbeResult, ProviderClient};

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// An external read-only rating service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Codeforces `user.info` API
    Codeforces,
    /// CodeChef community profile API
    CodeChef,
}

impl Provider {
    /// Both providers, in display order
    pub const ALL: [Provider; 2] = [Provider::Codeforces, Provider::CodeChef];

    /// Human-readable provider name
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Codeforces => "Codeforces",
            Provider::CodeChef => "CodeChef",
        }
    }

    /// Public endpoint used when no override is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Codeforces => codeforces::BASE_URL,
            Provider::CodeChef => codechef::BASE_URL,
        }
    }

    /// Builds the read endpoint for `handle` under `base_url`
    pub fn endpoint(&self, base_url: &str, handle: &str) -> Result<Url, FetchError> {
        match self {
            Provider::Codeforces => codeforces::endpoint(base_url, handle),
            Provider::CodeChef => codechef::endpoint(base_url, handle),
        }
    }

    /// Extracts the numeric rating from a provider response body
    pub fn parse_rating(&self, body: &str) -> Result<u32, FetchError> {
        match self {
            Provider::Codeforces => codeforces::parse_rating(body),
            Provider::CodeChef => codechef::parse_rating(body),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The last successfully retrieved rating for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderReading {
    /// Which provider the rating came from
    pub provider: Provider,
    /// Handle the rating belongs to
    pub handle: String,
    /// The rating value
    pub rating: u32,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

impl ProviderReading {
    /// Creates a reading stamped with the current time
    pub fn new(provider: Provider, handle: impl Into<String>, rating: u32) -> Self {
        Self {
            provider,
            handle: handle.into(),
            rating,
            fetched_at: Utc::now(),
        }
    }
}

/// Best-effort ratings for both providers; `None` means no live value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPair {
    pub codeforces: Option<u32>,
    pub codechef: Option<u32>,
}

impl RatingPair {
    /// Returns the slot for `provider`
    pub fn get(&self, provider: Provider) -> Option<u32> {
        match provider {
            Provider::Codeforces => self.codeforces,
            Provider::CodeChef => self.codechef,
        }
    }

    /// Overwrites the slot for `provider`
    pub fn set(&mut self, provider: Provider, rating: Option<u32>) {
        match provider {
            Provider::Codeforces => self.codeforces = rating,
            Provider::CodeChef => self.codechef = rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_and_serialization() {
        assert_eq!(Provider::Codeforces.to_string(), "Codeforces");
        assert_eq!(Provider::CodeChef.to_string(), "CodeChef");

        let json = serde_json::to_string(&Provider::CodeChef).unwrap();
        assert_eq!(json, "\"codechef\"");
    }

    #[test]
    fn test_provider_dispatches_to_adapter() {
        let url = Provider::Codeforces
            .endpoint("https://codeforces.com/api/user.info", "alice")
            .unwrap();
        assert_eq!(url.as_str(), "https://codeforces.com/api/user.info?handles=alice");

        let url = Provider::CodeChef
            .endpoint("https://codechef-api.vercel.app", "bob")
            .unwrap();
        assert_eq!(url.as_str(), "https://codechef-api.vercel.app/bob");
    }

    #[test]
    fn test_rating_pair_get_and_set() {
        let mut pair = RatingPair::default();
        assert_eq!(pair.get(Provider::Codeforces), None);

        pair.set(Provider::Codeforces, Some(1600));
        pair.set(Provider::CodeChef, Some(1889));

        assert_eq!(pair.codeforces, Some(1600));
        assert_eq!(pair.get(Provider::CodeChef), Some(1889));
    }

    #[test]
    fn test_reading_records_fetch_time() {
        let before = Utc::now();
        let reading = ProviderReading::new(Provider::Codeforces, "alice", 1600);
        assert!(reading.fetched_at >= before);
        assert_eq!(reading.handle, "alice");
    }
}
