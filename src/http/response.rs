//! Response carrier.
//!
//! # Responsibilities
//! - Collect status, headers and body written by chain members
//! - Report whether any member has already answered
//! - Convert into an axum response for the transport
//!
//! # Design Decisions
//! - No status until a member sets one; "committed" means a status exists
//! - A response nobody answered converts to 404 Not Found

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

#[derive(Debug, Default, Clone)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = Some(status);
        self
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether a member has already produced an answer.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn header(&mut self, name: HeaderName, value: &str) -> &mut Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "Dropping invalid header value"),
        }
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&mut self, mime: &str) -> &mut Self {
        self.header(header::CONTENT_TYPE, mime)
    }

    /// Plain-text body. Sets 200 OK unless a status was already chosen.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.content_type("text/plain; charset=utf-8");
        self.body = Bytes::from(body.into());
        self.status.get_or_insert(StatusCode::OK);
        self
    }

    /// JSON body. Sets 200 OK unless a status was already chosen.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, serde_json::Error> {
        let encoded = serde_json::to_vec(value)?;
        self.content_type("application/json");
        self.body = Bytes::from(encoded);
        self.status.get_or_insert(StatusCode::OK);
        Ok(self)
    }

    /// Raw body; status and content type are left to the caller.
    pub fn bytes(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_http(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::NOT_FOUND);
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_by_default() {
        let response = Response::new();
        assert!(!response.is_committed());
        assert_eq!(response.into_http().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_text_keeps_explicit_status() {
        let mut response = Response::new();
        response.status(StatusCode::CREATED).text("made");
        assert_eq!(response.status_code(), Some(StatusCode::CREATED));

        let mut response = Response::new();
        response.text("ok");
        assert_eq!(response.status_code(), Some(StatusCode::OK));
        assert_eq!(response.body().as_ref(), b"ok");
    }

    #[test]
    fn test_json_body() {
        let mut response = Response::new();
        response.json(&serde_json::json!({"id": 7})).unwrap();
        let http = response.into_http();
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(
            http.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
