//! Command-line interface parsing for cpratings
//!
//! Every option can also come from the environment, so the same binary can be
//! configured from a shell profile or a service unit.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use reqwest::Url;
use thiserror::Error;

use crate::cache::DEFAULT_TTL;
use crate::data::{codechef, codeforces, Provider, ProviderClient};
use crate::logging::LogTarget;
use crate::tracker::{Ratings, TrackerConfig, DEFAULT_CODECHEF_FALLBACK, DEFAULT_CODEFORCES_FALLBACK};

/// Codeforces handle used when none is configured
pub const DEFAULT_CODEFORCES_HANDLE: &str = "_.Manish._";

/// CodeChef handle used when none is configured
pub const DEFAULT_CODECHEF_HANDLE: &str = "manishk5507";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A handle was empty or whitespace
    #[error("{0} handle must not be empty")]
    EmptyHandle(Provider),

    /// The request timeout was zero
    #[error("timeout must be at least 1 second")]
    InvalidTimeout,

    /// A base URL override did not parse
    #[error("invalid {provider} API URL '{url}': {reason}")]
    InvalidUrl {
        provider: Provider,
        url: String,
        reason: String,
    },
}

/// cpratings - Codeforces and CodeChef ratings with caching and fallbacks
#[derive(Parser, Debug)]
#[command(name = "cpratings")]
#[command(about = "Codeforces and CodeChef ratings with caching and fallbacks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Codeforces handle to track
    #[arg(long, env = "CODEFORCES_HANDLE", default_value = DEFAULT_CODEFORCES_HANDLE, global = true)]
    pub codeforces_handle: String,

    /// CodeChef handle to track
    #[arg(long, env = "CODECHEF_HANDLE", default_value = DEFAULT_CODECHEF_HANDLE, global = true)]
    pub codechef_handle: String,

    /// Codeforces rating shown when the live value is unavailable
    #[arg(long, env = "CODEFORCES_FALLBACK", default_value_t = DEFAULT_CODEFORCES_FALLBACK, global = true)]
    pub codeforces_fallback: u32,

    /// CodeChef rating shown when the live value is unavailable
    #[arg(long, env = "CODECHEF_FALLBACK", default_value_t = DEFAULT_CODECHEF_FALLBACK, global = true)]
    pub codechef_fallback: u32,

    /// Per-request deadline in seconds
    #[arg(long, env = "CPRATINGS_TIMEOUT_SECS", default_value_t = 8, global = true)]
    pub timeout_secs: u64,

    /// How long a fetched rating stays fresh, in seconds
    #[arg(long, env = "CPRATINGS_CACHE_TTL_SECS", default_value_t = DEFAULT_TTL.as_secs(), global = true)]
    pub cache_ttl_secs: u64,

    /// Codeforces user.info endpoint
    #[arg(long, env = "CODEFORCES_API_URL", default_value = codeforces::BASE_URL, global = true)]
    pub codeforces_url: String,

    /// CodeChef profile API base URL
    #[arg(long, env = "CODECHEF_API_URL", default_value = codechef::BASE_URL, global = true)]
    pub codechef_url: String,

    /// Append logs to this file (the interactive view logs nowhere else)
    #[arg(long, env = "CPRATINGS_LOG_FILE", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// What to do once ratings are configured
#[derive(Subcommand, Debug, Clone, Default, PartialEq, Eq)]
pub enum Command {
    /// Interactive view with manual refresh (default)
    #[default]
    Watch,
    /// Fetch once and print the result
    Show {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query both APIs directly and print the raw responses
    Probe,
}

/// Validated settings derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub command: Command,
    pub tracker: TrackerConfig,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub codeforces_url: String,
    pub codechef_url: String,
    pub verbosity: u8,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with handles trimmed and URLs checked
    /// * `Err(CliError)` if a handle is blank, the timeout is zero, or a URL is malformed
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let codeforces_handle = non_empty_handle(Provider::Codeforces, &cli.codeforces_handle)?;
        let codechef_handle = non_empty_handle(Provider::CodeChef, &cli.codechef_handle)?;

        if cli.timeout_secs == 0 {
            return Err(CliError::InvalidTimeout);
        }

        check_url(Provider::Codeforces, &cli.codeforces_url)?;
        check_url(Provider::CodeChef, &cli.codechef_url)?;

        Ok(Settings {
            command: cli.command.clone().unwrap_or_default(),
            tracker: TrackerConfig {
                codeforces_handle,
                codechef_handle,
                fallback: Ratings {
                    codeforces: cli.codeforces_fallback,
                    codechef: cli.codechef_fallback,
                },
            },
            timeout: Duration::from_secs(cli.timeout_secs),
            cache_ttl: Duration::from_secs(cli.cache_ttl_secs),
            codeforces_url: cli.codeforces_url.clone(),
            codechef_url: cli.codechef_url.clone(),
            verbosity: cli.verbose,
            log_file: cli.log_file.clone(),
        })
    }

    /// Provider client configured with these endpoints and deadline
    pub fn provider_client(&self) -> ProviderClient {
        ProviderClient::new()
            .with_base_urls(self.codeforces_url.clone(), self.codechef_url.clone())
            .with_timeout(self.timeout)
    }

    /// Where logs go for the selected command
    pub fn log_target(&self) -> LogTarget {
        match (&self.log_file, &self.command) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, Command::Watch) => LogTarget::Disabled,
            (None, _) => LogTarget::Stderr,
        }
    }
}

fn non_empty_handle(provider: Provider, handle: &str) -> Result<String, CliError> {
    let handle = handle.trim();
    if handle.is_empty() {
        return Err(CliError::EmptyHandle(provider));
    }
    Ok(handle.to_string())
}

fn check_url(provider: Provider, url: &str) -> Result<(), CliError> {
    Url::parse(url).map(|_| ()).map_err(|e| CliError::InvalidUrl {
        provider,
        url: url.to_string(),
        reason: e.to_string(),
    })
}
