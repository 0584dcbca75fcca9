//! Log output setup
//!
//! `RUST_LOG` wins when set; otherwise the `-v` count picks the level for this
//! crate. The interactive view owns the terminal, so it logs to a file or not
//! at all.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while installing the log subscriber
#[derive(Debug, Error)]
pub enum LogError {
    /// The log file could not be opened
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber was already installed
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

/// Default filter directive for a `-v` count
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "cpratings=warn",
        1 => "cpratings=info",
        2 => "cpratings=debug",
        _ => "cpratings=trace",
    }
}

fn build_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Installs the global subscriber
pub fn init(verbosity: u8, target: &LogTarget) -> Result<(), LogError> {
    let filter = build_filter(verbosity);

    let result = match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LogError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    result.map_err(|e| LogError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_by_verbosity() {
        assert_eq!(default_directive(0), "cpratings=warn");
        assert_eq!(default_directive(1), "cpratings=info");
        assert_eq!(default_directive(2), "cpratings=debug");
        assert_eq!(default_directive(7), "cpratings=trace");
    }

    #[test]
    fn test_disabled_target_installs_nothing() {
        assert!(init(3, &LogTarget::Disabled).is_ok());
    }

    #[test]
    fn test_unopenable_log_file() {
        let path = PathBuf::from("/nonexistent-dir/cpratings/log.txt");
        match init(0, &LogTarget::File(path)) {
            Err(LogError::OpenFile { path, .. }) => {
                assert!(path.ends_with("log.txt"));
            }
            other => panic!("Expected OpenFile error, got {:?}", other),
        }
    }
}
