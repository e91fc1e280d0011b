//! Request path resources.
//!
//! # Responsibilities
//! - Split a decoded request path into raw segments
//! - Infer the primitive type of every request segment
//!
//! # Design Decisions
//! - Built once per request, never mutated afterwards
//! - Empty segments are dropped, so `/a//b/` and `/a/b` are the same resource
//! - The first element is the root marker `/`, mirroring compiled templates

use crate::routing::template::ValueType;

/// Marker segment standing for the path separator at the root.
pub const ROOT_SEGMENT: &str = "/";

/// Split a path on `/`, trimming each piece and dropping empty ones.
///
/// The root marker is always the first element.
pub fn split_path(path: &str) -> Vec<&str> {
    std::iter::once(ROOT_SEGMENT)
        .chain(path.split('/').map(str::trim).filter(|s| !s.is_empty()))
        .collect()
}

/// Join a root path and a relative path with exactly one `/` between them.
pub fn join_path(root: &str, path: &str) -> String {
    match (root.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", root, &path[1..]),
        (false, false) => format!("{}/{}", root, path),
        _ => format!("{}{}", root, path),
    }
}

/// Infer the type of a single request segment.
///
/// - all digits, optionally a leading `-` → `Integer`
/// - exactly one `.`, neither first nor last, digits otherwise → `Decimal`
/// - anything else → `String`
pub fn infer_type(value: &str) -> ValueType {
    if value.is_empty() {
        return ValueType::String;
    }
    let last = value.len() - 1;
    let mut dots = 0;
    for (i, c) in value.char_indices() {
        if c == '.' {
            dots += 1;
            if dots > 1 || i == 0 || i == last {
                return ValueType::String;
            }
        } else if !(c.is_ascii_digit() || (i == 0 && c == '-')) {
            return ValueType::String;
        }
    }
    if dots == 0 {
        ValueType::Integer
    } else {
        ValueType::Decimal
    }
}

/// The segments of one request path plus their inferred types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResource {
    segments: Vec<String>,
    types: Vec<ValueType>,
}

impl PathResource {
    pub fn parse(path: &str) -> Self {
        let segments: Vec<String> = split_path(path).into_iter().map(str::to_string).collect();
        let types = segments.iter().map(|s| infer_type(s)).collect();
        Self { segments, types }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Never true in practice: the root marker is always present.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn types(&self) -> &[ValueType] {
        &self.types
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn value_type(&self, index: usize) -> Option<ValueType> {
        self.types.get(index).copied()
    }

    /// Segments after the root marker.
    pub fn relative(&self) -> &[String] {
        &self.segments[1..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_adds_root_marker() {
        assert_eq!(split_path("/users/yoojia"), vec!["/", "users", "yoojia"]);
        assert_eq!(split_path("users//yoojia/"), vec!["/", "users", "yoojia"]);
        assert_eq!(split_path("/"), vec!["/"]);
        assert_eq!(split_path(""), vec!["/"]);
        assert_eq!(split_path("/ a / b "), vec!["/", "a", "b"]);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("/api", "users"), "/api/users");
        assert_eq!(join_path("/api/", "users"), "/api/users");
        assert_eq!(join_path("/api", "/users"), "/api/users");
        assert_eq!(join_path("/", "/"), "/");
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(infer_type("42"), ValueType::Integer);
        assert_eq!(infer_type("-5"), ValueType::Integer);
        assert_eq!(infer_type("4.2"), ValueType::Decimal);
        assert_eq!(infer_type("4."), ValueType::String);
        assert_eq!(infer_type(".4"), ValueType::String);
        assert_eq!(infer_type("4.2.1"), ValueType::String);
        assert_eq!(infer_type("abc"), ValueType::String);
        assert_eq!(infer_type("4-2"), ValueType::String);
        assert_eq!(infer_type("/"), ValueType::String);
        assert_eq!(infer_type("１２"), ValueType::String);
    }

    #[test]
    fn test_resource_types_follow_segments() {
        let resource = PathResource::parse("/users/42/score/9.5");
        assert_eq!(resource.len(), 5);
        assert_eq!(resource.segment(2), Some("42"));
        assert_eq!(
            resource.types(),
            &[
                ValueType::String,
                ValueType::String,
                ValueType::Integer,
                ValueType::String,
                ValueType::Decimal,
            ]
        );
        assert_eq!(resource.relative(), &["users", "42", "score", "9.5"]);
    }
}
