//! Segment matching logic.
//!
//! # Responsibilities
//! - Decide whether a request resource satisfies a compiled template
//! - Extract dynamic-parameter bindings positionally after a match
//!
//! # Design Decisions
//! - Literal comparison is case-sensitive
//! - Dynamic comparison checks types only, never names
//! - A trailing wildcard absorbs zero or more request segments
//! - Matching never fails loudly: a short or empty resource is just `false`

use std::collections::HashMap;

use crate::routing::resource::PathResource;
use crate::routing::template::{Segment, UriTemplate};

/// Name to raw-string bindings produced by a successful match.
pub type DynamicParams = HashMap<String, String>;

/// Trait for matching request resources against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the resource satisfies this condition.
    fn matches(&self, resource: &PathResource) -> bool;
}

impl Matcher for UriTemplate {
    fn matches(&self, resource: &PathResource) -> bool {
        matches(resource, self)
    }
}

/// Matches when any inner matcher does (OR semantics).
#[derive(Debug)]
pub struct AnyMatcher<M> {
    matchers: Vec<M>,
}

impl<M: Matcher> AnyMatcher<M> {
    pub fn new(matchers: Vec<M>) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &[M] {
        &self.matchers
    }
}

impl<M: Matcher> Matcher for AnyMatcher<M> {
    fn matches(&self, resource: &PathResource) -> bool {
        self.matchers.iter().any(|m| m.matches(resource))
    }
}

/// Whether `resource` satisfies `template`.
pub fn matches(resource: &PathResource, template: &UriTemplate) -> bool {
    let segments = template.segments();
    if template.ends_with_wildcard() {
        let fixed = segments.len() - 1;
        resource.len() >= fixed && compare(resource, &segments[..fixed])
    } else {
        resource.len() == segments.len() && compare(resource, segments)
    }
}

fn compare(resource: &PathResource, segments: &[Segment]) -> bool {
    segments.iter().enumerate().all(|(i, segment)| {
        let (Some(raw), Some(actual)) = (resource.segment(i), resource.value_type(i)) else {
            return false;
        };
        match segment {
            Segment::Literal { text } => text == raw,
            Segment::Dynamic { value_type, .. } => value_type.accepts(actual),
            Segment::Wildcard => true,
        }
    })
}

/// Bindings for every dynamic segment of a template that matched `resource`.
///
/// Wildcards bind nothing. Call only after [`matches`] returned true.
pub fn extract_bindings(resource: &PathResource, template: &UriTemplate) -> DynamicParams {
    template
        .segments()
        .iter()
        .enumerate()
        .filter_map(|(i, segment)| match segment {
            Segment::Dynamic { name, .. } => resource
                .segment(i)
                .map(|value| (name.clone(), value.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::template::HttpMethod;

    fn template(source: &str) -> UriTemplate {
        UriTemplate::parse(HttpMethod::Get, source).unwrap()
    }

    fn path(source: &str) -> PathResource {
        PathResource::parse(source)
    }

    #[test]
    fn test_literal_match_is_case_sensitive() {
        let t = template("/users/list");
        assert!(matches(&path("/users/list"), &t));
        assert!(!matches(&path("/Users/list"), &t));
        assert!(!matches(&path("/users"), &t));
        assert!(!matches(&path("/users/list/extra"), &t));
    }

    #[test]
    fn test_typed_dynamic_segments() {
        let t = template("/users/{int:id}");
        assert!(matches(&path("/users/42"), &t));
        assert!(matches(&path("/users/-42"), &t));
        assert!(!matches(&path("/users/4.2"), &t));
        assert!(!matches(&path("/users/bob"), &t));

        let t = template("/price/{float:p}");
        assert!(matches(&path("/price/9.99"), &t));
        assert!(!matches(&path("/price/9"), &t));

        let t = template("/name/{string:n}");
        assert!(matches(&path("/name/bob"), &t));
        assert!(!matches(&path("/name/42"), &t));
    }

    #[test]
    fn test_untyped_dynamic_accepts_everything() {
        let t = template("/users/{id}");
        for p in ["/users/42", "/users/4.2", "/users/bob"] {
            assert!(matches(&path(p), &t), "{}", p);
        }
    }

    #[test]
    fn test_wildcard_matches_any_suffix() {
        let t = template("/assets/*");
        assert!(matches(&path("/assets"), &t));
        assert!(matches(&path("/assets/a"), &t));
        assert!(matches(&path("/assets/a/b/c"), &t));
        assert!(!matches(&path("/other"), &t));
        assert!(!matches(&path("/"), &t));
    }

    #[test]
    fn test_root_wildcard_matches_everything() {
        let t = template("/*");
        assert!(matches(&path("/"), &t));
        assert!(matches(&path("/anything/at/all"), &t));
    }

    #[test]
    fn test_matching_is_pure() {
        let t = template("/users/{int:id}/posts/*");
        let p = path("/users/7/posts/2024/01");
        let first = matches(&p, &t);
        let second = matches(&p, &t);
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(p, path("/users/7/posts/2024/01"));
    }

    #[test]
    fn test_binding_extraction() {
        let t = template("/users/{int:id}/name/{string:n}");
        let p = path("/users/42/name/bob");
        assert!(matches(&p, &t));
        let bindings = extract_bindings(&p, &t);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get("id").map(String::as_str), Some("42"));
        assert_eq!(bindings.get("n").map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_wildcard_binds_nothing() {
        let t = template("/files/{dir}/*");
        let bindings = extract_bindings(&path("/files/img/a/b.png"), &t);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("dir").map(String::as_str), Some("img"));
    }

    #[test]
    fn test_any_matcher() {
        let any = AnyMatcher::new(vec![template("/static/*"), template("/favicon.ico")]);
        assert!(any.matches(&path("/static/app.js")));
        assert!(any.matches(&path("/favicon.ico")));
        assert!(!any.matches(&path("/api")));
    }
}
