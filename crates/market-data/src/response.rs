//! HTTP response handling.

use crate::FetchError;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 416: the requested row range starts past the end of the result set.
    pub fn is_range_not_satisfiable(&self) -> bool {
        self.status == 416
    }

    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::ParseError(e.to_string()))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Total row count from a `Content-Range: 0-11/25` (or `*/0`) header.
    /// `None` when the header is absent or the total is unknown (`0-11/*`).
    pub fn content_range_total(&self) -> Option<u64> {
        let value = self.header("Content-Range")?;
        let (_, total) = value.trim().rsplit_once('/')?;
        total.trim().parse().ok()
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    ///
    /// The error message is the backend's `message` field when the body is a
    /// JSON error object, else the raw body.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .or_else(|| self.text().ok().filter(|t| !t.trim().is_empty()))
            .unwrap_or_else(|| "Unknown error".to_string());
        Err(FetchError::HttpError {
            status: self.status,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> Response {
        Response::new(status, HashMap::new(), body.to_vec())
    }

    fn make_response_with_headers(
        status: u16,
        headers: Vec<(&str, &str)>,
        body: &[u8],
    ) -> Response {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Response::new(status, headers, body.to_vec())
    }

    // === Status Check Tests ===

    #[test]
    fn test_response_status_classes() {
        assert!(make_response(200, b"").is_success());
        assert!(make_response(206, b"").is_success());
        assert!(!make_response(300, b"").is_success());
        assert!(make_response(416, b"").is_range_not_satisfiable());
    }

    // === Body Tests ===

    #[test]
    fn test_response_json_rows() {
        let resp = make_response(200, br#"[{"id": 1}, {"id": 2}]"#);
        let rows: Vec<serde_json::Value> = resp.json().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(make_response(200, b"not json").json::<Vec<serde_json::Value>>().is_err());
    }

    #[test]
    fn test_response_text_invalid_utf8() {
        let resp = make_response(200, &[0xff, 0xfe]);
        assert!(resp.text().is_err());
    }

    // === Header Tests ===

    #[test]
    fn test_response_header_case_insensitive() {
        let resp = make_response_with_headers(200, vec![("Content-Type", "application/json")], b"");
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn test_content_range_total() {
        let total = |v: &str| {
            make_response_with_headers(206, vec![("content-range", v)], b"").content_range_total()
        };
        assert_eq!(total("0-11/25"), Some(25));
        assert_eq!(total("*/0"), Some(0));
        assert_eq!(total("0-11/*"), None);
        assert_eq!(make_response(200, b"").content_range_total(), None);
    }

    // === error_for_status Tests ===

    #[test]
    fn test_error_for_status_uses_backend_message() {
        let resp = make_response(400, br#"{"code":"42703","message":"column does not exist"}"#);
        match resp.error_for_status() {
            Err(FetchError::HttpError { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "column does not exist");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_plain_body() {
        let resp = make_response(502, b"Bad Gateway");
        assert!(matches!(
            resp.error_for_status(),
            Err(FetchError::HttpError { status: 502, ref message }) if message == "Bad Gateway"
        ));
        assert!(make_response(200, b"OK").error_for_status().is_ok());
    }
}
