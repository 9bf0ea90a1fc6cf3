//! Request and response types shared across the client
//!
//! Feature services describe calls as `ApiRequest` values and get back an
//! `ApiResponse` of `(status, body)` — the recovery machinery in between is
//! invisible to them.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// One outbound API call: method, path relative to the configured base URL,
/// optional JSON body, and extra headers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header; invalid names or values are skipped with a warning
    /// rather than failing the whole request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                tracing::warn!(header = name, "skipping invalid header");
            }
        }
        self
    }
}

/// A completed response: status and raw body. Non-2xx statuses are values,
/// not errors — callers branch on `status` the same way for 200 and 403.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::InvalidResponse(format!("decoding response body: {e}")))
    }

    /// Body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_header_attaches_valid_headers() {
        let request = ApiRequest::new(Method::GET, "/widgets")
            .with_header("x-request-source", "admin-shell");
        assert_eq!(
            request.headers.get("x-request-source").unwrap(),
            "admin-shell"
        );
    }

    #[test]
    fn with_header_skips_invalid_names() {
        let request = ApiRequest::new(Method::GET, "/widgets").with_header("bad name", "v");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn response_json_decodes_body() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(br#"{"count": 3}"#),
        };
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn response_json_decode_failure_is_invalid_response() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"<html>"),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn response_text_is_lossy() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: Bytes::from_static(b"plain"),
        };
        assert_eq!(response.text(), "plain");
    }
}
