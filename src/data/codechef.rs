//! CodeChef profile adapter
//!
//! The community CodeChef API answers `GET <base>/<handle>` with
//! `{success, currentRating}`; older deployments send a bare `{rating}` instead.
//! Ratings may arrive as strings or numbers.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::FetchError;

/// Base URL for the CodeChef profile API
pub const BASE_URL: &str = "https://codechef-api.vercel.app";

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, rename = "currentRating")]
    current_rating: Option<Value>,
    /// Legacy response format
    #[serde(default)]
    rating: Option<Value>,
}

/// Builds `<base>/<handle>`
pub fn endpoint(base_url: &str, handle: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|()| FetchError::InvalidUrl(format!("{}: cannot be a base", base_url)))?
        .pop_if_empty()
        .push(handle);

    Ok(url)
}

/// Parses a profile response body into a rating
pub fn parse_rating(body: &str) -> Result<u32, FetchError> {
    let ProfileResponse {
        success,
        current_rating,
        rating,
    } = serde_json::from_str(body)?;

    let raw = current_rating
        .filter(|value| success && is_present(value))
        .or_else(|| rating.filter(is_present))
        .ok_or_else(|| FetchError::Parse("missing rating field".to_string()))?;

    rating_value(&raw)
}

/// Null and empty strings count as missing
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn rating_value(value: &Value) -> Result<u32, FetchError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => leading_integer(s),
        _ => None,
    };

    parsed.ok_or_else(|| FetchError::Parse(format!("invalid rating value: {}", value)))
}

/// Reads the leading decimal digits of `s`, ignoring anything after them
fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
