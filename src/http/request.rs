//! Request carrier.
//!
//! # Responsibilities
//! - Hold the method, decoded path, query parameters, headers and body of
//!   one incoming request
//! - Strip the configured context path before routing sees the path
//! - Expose query parameters with typed accessors
//!
//! # Design Decisions
//! - Transport-agnostic: built from axum `Parts` or directly from a URI string
//! - The method is upper-cased once, at construction
//! - The body is fully buffered; the transport enforces the size limit

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// One incoming request, as seen by the dispatch engine.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    path: String,
    raw_path: String,
    query: HashMap<String, Vec<String>>,
    headers: HeaderMap,
    body: Bytes,
    received_at: Instant,
}

impl Request {
    /// Build from a method and a request target (`/path?query`), with no
    /// context path.
    pub fn new(method: &str, uri: &str) -> Self {
        Self::mounted(method, uri, "/")
    }

    /// Build from a method and request target, stripping `context_path`.
    pub fn mounted(method: &str, uri: &str, context_path: &str) -> Self {
        let (raw_path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: strip_context_path(&decode(raw_path), context_path),
            raw_path: raw_path.to_string(),
            query: parse_query(query),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            received_at: Instant::now(),
        }
    }

    /// Build from the parts of an `http` request plus its buffered body.
    pub fn from_http(parts: &Parts, body: Bytes, context_path: &str) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut request = Self::mounted(parts.method.as_str(), target, context_path);
        request.headers = parts.headers.clone();
        request.body = body;
        request
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(HeaderName::from_static(name), value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Upper-cased request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Decoded path relative to the context path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path exactly as received, before decoding and stripping.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, or `None` when empty or not valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        if self.body.is_empty() {
            return None;
        }
        std::str::from_utf8(&self.body).ok()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// First value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a query parameter, in arrival order.
    pub fn param_values(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn params(&self) -> &HashMap<String, Vec<String>> {
        &self.query
    }

    /// Parse the first value of a query parameter. A missing or empty value
    /// yields `Ok(None)`.
    pub fn param_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, T::Err> {
        match self.param(name) {
            Some(value) if !value.is_empty() => value.parse().map(Some),
            _ => Ok(None),
        }
    }

    /// Append a value; existing values for the name are kept.
    pub fn put_param(&mut self, name: impl Into<String>, value: impl ToString) {
        self.query
            .entry(name.into())
            .or_default()
            .push(value.to_string());
    }

    pub fn remove_param(&mut self, name: &str) -> Option<Vec<String>> {
        self.query.remove(name)
    }
}

fn decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Remove a mount prefix. A path outside the mount is returned unchanged.
fn strip_context_path(path: &str, context_path: &str) -> String {
    let prefix = context_path.trim_end_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(prefix) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = decode(&name.replace('+', " "));
        let value = decode(&value.replace('+', " "));
        params.entry(name).or_default().push(value);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_upper_cased() {
        assert_eq!(Request::new("get", "/").method(), "GET");
    }

    #[test]
    fn test_path_is_decoded() {
        let request = Request::new("GET", "/files/hello%20world.txt");
        assert_eq!(request.path(), "/files/hello world.txt");
        assert_eq!(request.raw_path(), "/files/hello%20world.txt");
    }

    #[test]
    fn test_context_path_is_stripped() {
        assert_eq!(Request::mounted("GET", "/app/users/1", "/app").path(), "/users/1");
        assert_eq!(Request::mounted("GET", "/app/users/1", "/app/").path(), "/users/1");
        assert_eq!(Request::mounted("GET", "/app", "/app").path(), "/");
        assert_eq!(Request::mounted("GET", "/application", "/app").path(), "/application");
        assert_eq!(Request::mounted("GET", "/users", "/").path(), "/users");
    }

    #[test]
    fn test_query_parameters() {
        let request = Request::new("GET", "/search?q=rust+lang&tag=a&tag=b&page=2&empty=");
        assert_eq!(request.param("q"), Some("rust lang"));
        assert_eq!(request.param_values("tag"), &["a", "b"]);
        assert_eq!(request.param_as::<u32>("page"), Ok(Some(2)));
        assert_eq!(request.param_as::<u32>("empty"), Ok(None));
        assert_eq!(request.param_as::<u32>("missing"), Ok(None));
        assert!(request.param_as::<u32>("q").is_err());
        assert_eq!(request.path(), "/search");
    }

    #[test]
    fn test_put_and_remove_param() {
        let mut request = Request::new("POST", "/form?a=1");
        request.put_param("a", 2);
        request.put_param("b", "x");
        assert_eq!(request.param_values("a"), &["1", "2"]);
        assert_eq!(request.remove_param("a"), Some(vec!["1".into(), "2".into()]));
        assert_eq!(request.param("a"), None);
        assert_eq!(request.param("b"), Some("x"));
    }

    #[test]
    fn test_headers_and_body() {
        let request = Request::new("POST", "/echo")
            .with_header(X_REQUEST_ID, "abc-123")
            .with_body("payload");
        assert_eq!(request.request_id(), Some("abc-123"));
        assert_eq!(request.body_text(), Some("payload"));
        assert_eq!(Request::new("GET", "/").body_text(), None);
    }
}
