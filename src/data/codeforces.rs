//! Codeforces `user.info` adapter
//!
//! Builds the read endpoint for a handle and pulls the rating out of the
//! `{status, result: [...]}` envelope.

use reqwest::Url;
use serde::Deserialize;

use super::FetchError;

/// Base URL for the Codeforces user info API
pub const BASE_URL: &str = "https://codeforces.com/api/user.info";

/// Envelope returned by every Codeforces API method
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    status: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    result: Vec<UserInfo>,
}

/// A single user record; unrated users have no `rating` field
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    rating: Option<i64>,
}

/// Builds `<base>?handles=<handle>`
pub fn endpoint(base_url: &str, handle: &str) -> Result<Url, FetchError> {
    Url::parse_with_params(base_url, &[("handles", handle)])
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))
}

/// Parses a `user.info` response body into a rating
///
/// An `OK` response whose first user has no rating yields `0`.
pub fn parse_rating(body: &str) -> Result<u32, FetchError> {
    let response: UserInfoResponse = serde_json::from_str(body)?;

    if response.status != "OK" {
        return Err(FetchError::Parse(format!(
            "status {}: {}",
            response.status,
            response.comment.unwrap_or_default()
        )));
    }

    let user = response
        .result
        .first()
        .ok_or_else(|| FetchError::Parse("empty result".to_string()))?;

    match user.rating {
        None => Ok(0),
        Some(rating) => u32::try_from(rating)
            .map_err(|_| FetchError::Parse(format!("rating out of range: {}", rating))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RESPONSE: &str = r#"{
        "status": "OK",
        "result": [
            {
                "handle": "alice",
                "rating": 1600,
                "maxRating": 1650,
                "rank": "expert",
                "contribution": 0
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_response() {
        assert_eq!(parse_rating(VALID_RESPONSE).unwrap(), 1600);
    }

    #[test]
    fn test_parse_unrated_user_is_zero() {
        let body = r#"{"status": "OK", "result": [{"handle": "newbie"}]}"#;
        assert_eq!(parse_rating(body).unwrap(), 0);
    }

    #[test]
    fn test_parse_uses_first_result() {
        let body = r#"{"status": "OK", "result": [{"rating": 1200}, {"rating": 2400}]}"#;
        assert_eq!(parse_rating(body).unwrap(), 1200);
    }

    #[test]
    fn test_parse_failed_status() {
        let body = r#"{"status": "FAILED", "comment": "handles: User with handle x not found"}"#;
        match parse_rating(body) {
            Err(FetchError::Parse(msg)) => {
                assert!(msg.contains("FAILED"));
                assert!(msg.contains("not found"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{"status": "OK", "result": []}"#;
        assert!(matches!(parse_rating(body), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(matches!(
            parse_rating("{ invalid json }"),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn test_endpoint_encodes_handle() {
        let url = endpoint(BASE_URL, "_.Manish._").unwrap();
        assert_eq!(
            url.as_str(),
            "https://codeforces.com/api/user.info?handles=_.Manish._"
        );

        let url = endpoint(BASE_URL, "a b&c").unwrap();
        assert_eq!(url.query(), Some("handles=a+b%26c"));
    }

    #[test]
    fn test_endpoint_rejects_invalid_base() {
        assert!(matches!(
            endpoint("not a url", "alice"),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
