//! URI template compilation.
//!
//! # Responsibilities
//! - Parse a route string (`/users/{int:id}/posts/*`) into typed segments
//! - Reject malformed templates at registration time, never at request time
//! - Carry the HTTP method and the precomputed priority with the template
//!
//! # Design Decisions
//! - Templates are immutable once compiled
//! - The first segment is always the virtual root marker `/`, so template
//!   depth lines up with a [`PathResource`](crate::routing::PathResource)
//! - Untyped `{name}` compiles to `Any` unless the compiler runs with
//!   absolute typing, in which case it compiles to `String`

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::routing::priority;
use crate::routing::resource::{split_path, ROOT_SEGMENT};

/// Errors raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Unbalanced `{`/`}` delimiters, or an empty parameter name.
    #[error("malformed segment `{segment}` in template `{template}`")]
    MalformedSegment { template: String, segment: String },

    /// `*` used anywhere but the final segment.
    #[error("wildcard must be the last segment in template `{template}`")]
    WildcardNotLast { template: String },
}

/// Primitive value type of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Any,
    String,
    Integer,
    Decimal,
}

impl ValueType {
    /// Whether a declared type accepts a request segment of type `actual`.
    ///
    /// `Any` accepts everything; otherwise the types must be equal. There is
    /// no widening: an `Integer` declaration rejects a `Decimal` value.
    pub fn accepts(self, actual: ValueType) -> bool {
        self == ValueType::Any || self == actual
    }

    fn prefix(self) -> Option<&'static str> {
        match self {
            ValueType::Any => None,
            ValueType::String => Some("string"),
            ValueType::Integer => Some("int"),
            ValueType::Decimal => Some("float"),
        }
    }
}

/// HTTP method a template is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::All => "ALL",
        }
    }

    /// `ALL` accepts any request method; the others compare exactly against
    /// the upper-cased request method.
    pub fn accepts(&self, request_method: &str) -> bool {
        matches!(self, HttpMethod::All) || self.as_str() == request_method
    }

    /// Whether some request method is accepted by both.
    pub fn overlaps(self, other: HttpMethod) -> bool {
        self == other || self == HttpMethod::All || other == HttpMethod::All
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "ALL" => Ok(HttpMethod::All),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled unit of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// Must equal the request segment exactly (case-sensitive).
    Literal { text: String },
    /// Binds the request segment under `name`.
    ///
    /// `explicit` records whether the type came from an `int:`/`float:`/
    /// `string:` prefix; it drives ranking and the canonical form.
    Dynamic {
        name: String,
        value_type: ValueType,
        explicit: bool,
    },
    /// Absorbs zero or more trailing request segments.
    Wildcard,
}

impl Segment {
    pub fn literal(text: impl Into<String>) -> Self {
        Segment::Literal { text: text.into() }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Dynamic { .. })
    }

    /// Compares two segments ignoring parameter names.
    pub fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal { text: a }, Segment::Literal { text: b }) => a == b,
            (
                Segment::Dynamic { value_type: a, .. },
                Segment::Dynamic { value_type: b, .. },
            ) => a == b,
            (Segment::Wildcard, Segment::Wildcard) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal { text } => f.write_str(text),
            Segment::Dynamic {
                name,
                value_type,
                explicit,
            } => match value_type.prefix().filter(|_| *explicit) {
                Some(prefix) => write!(f, "{{{}:{}}}", prefix, name),
                None => write!(f, "{{{}}}", name),
            },
            Segment::Wildcard => f.write_str("*"),
        }
    }
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    method: HttpMethod,
    segments: Vec<Segment>,
    raw: String,
    priority: i32,
}

impl UriTemplate {
    /// Compile with the default (non-absolute) typing rules.
    pub fn parse(method: HttpMethod, template: &str) -> Result<Self, TemplateError> {
        TemplateCompiler::default().compile(method, template)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Segments including the leading root marker.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The template string as it was registered.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn ends_with_wildcard(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_wildcard)
    }

    /// Names of the dynamic segments, in positional order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Dynamic { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Overlapping methods and the same segment shape, parameter names
    /// ignored. `ALL` overlaps every method.
    pub fn same_shape(&self, other: &UriTemplate) -> bool {
        self.method.overlaps(other.method)
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }
}

/// Canonical form: segments after the root marker rejoined with `/`.
impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = self.segments.get(1..).unwrap_or_default();
        if rest.is_empty() {
            return f.write_str(ROOT_SEGMENT);
        }
        for segment in rest {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Compiles route strings into [`UriTemplate`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateCompiler {
    absolute_typing: bool,
}

impl TemplateCompiler {
    pub fn new(absolute_typing: bool) -> Self {
        Self { absolute_typing }
    }

    pub fn absolute_typing(&self) -> bool {
        self.absolute_typing
    }

    pub fn compile(&self, method: HttpMethod, template: &str) -> Result<UriTemplate, TemplateError> {
        let parts = split_path(template);
        let last = parts.len() - 1;

        let mut segments = Vec::with_capacity(parts.len());
        segments.push(Segment::literal(ROOT_SEGMENT));

        for (index, part) in parts.iter().enumerate().skip(1) {
            let segment = self.compile_segment(template, part)?;
            if segment.is_wildcard() && index != last {
                return Err(TemplateError::WildcardNotLast {
                    template: template.to_string(),
                });
            }
            segments.push(segment);
        }

        let priority = priority::rank(&segments);
        tracing::trace!(template, %method, priority, "Template compiled");

        Ok(UriTemplate {
            method,
            segments,
            raw: template.to_string(),
            priority,
        })
    }

    fn compile_segment(&self, template: &str, text: &str) -> Result<Segment, TemplateError> {
        let malformed = || TemplateError::MalformedSegment {
            template: template.to_string(),
            segment: text.to_string(),
        };

        let opens = text.starts_with('{');
        let closes = text.ends_with('}');

        if opens != closes {
            return Err(malformed());
        }

        if opens {
            if text.len() < 3 {
                return Err(malformed());
            }
            let inner = &text[1..text.len() - 1];
            let (value_type, explicit, name) = if let Some(name) = inner.strip_prefix("int:") {
                (ValueType::Integer, true, name)
            } else if let Some(name) = inner.strip_prefix("float:") {
                (ValueType::Decimal, true, name)
            } else if let Some(name) = inner.strip_prefix("string:") {
                (ValueType::String, true, name)
            } else if self.absolute_typing {
                (ValueType::String, false, inner)
            } else {
                (ValueType::Any, false, inner)
            };
            if name.is_empty() || name.contains(['{', '}']) {
                return Err(malformed());
            }
            return Ok(Segment::Dynamic {
                name: name.to_string(),
                value_type,
                explicit,
            });
        }

        if text == "*" {
            return Ok(Segment::Wildcard);
        }

        if text.contains(['{', '}']) {
            return Err(malformed());
        }

        Ok(Segment::literal(text))
    }
}

/// Turns a mount path ending in `/` into an explicit wildcard mount.
///
/// `/static/` becomes `/static/*`; anything else is returned unchanged.
/// Applied by callers at the registration boundary, not by the compiler.
pub fn normalize_mount(path: &str) -> String {
    if path.ends_with('/') {
        format!("{}*", path)
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: &str) -> UriTemplate {
        UriTemplate::parse(HttpMethod::Get, template).unwrap()
    }

    #[test]
    fn test_compiles_typed_segments() {
        let template = compile("/users/{int:id}/posts/*");
        assert_eq!(
            template.segments(),
            &[
                Segment::literal("/"),
                Segment::literal("users"),
                Segment::Dynamic {
                    name: "id".into(),
                    value_type: ValueType::Integer,
                    explicit: true,
                },
                Segment::literal("posts"),
                Segment::Wildcard,
            ]
        );
        assert!(template.ends_with_wildcard());
    }

    #[test]
    fn test_prefixes_set_declared_type() {
        let template = compile("/{int:a}/{float:b}/{string:c}/{d}");
        let types: Vec<_> = template
            .segments()
            .iter()
            .filter_map(|s| match s {
                Segment::Dynamic { value_type, .. } => Some(*value_type),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![ValueType::Integer, ValueType::Decimal, ValueType::String, ValueType::Any]
        );
        assert_eq!(template.parameter_names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_absolute_typing_makes_untyped_string() {
        let template = TemplateCompiler::new(true)
            .compile(HttpMethod::Get, "/users/{id}")
            .unwrap();
        assert_eq!(
            template.segments()[2],
            Segment::Dynamic {
                name: "id".into(),
                value_type: ValueType::String,
                explicit: false,
            }
        );
        // Still ranked as untyped.
        assert_eq!(template.priority(), compile("/users/{id}").priority());
    }

    #[test]
    fn test_unbalanced_braces_are_malformed() {
        for bad in ["/users/{id", "/users/id}", "/{", "/}", "/{}", "/{int:}", "/a{b", "/{{a}}"] {
            let err = UriTemplate::parse(HttpMethod::Get, bad).unwrap_err();
            assert!(
                matches!(err, TemplateError::MalformedSegment { .. }),
                "{} should be malformed, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let err = UriTemplate::parse(HttpMethod::Get, "/assets/*/logo").unwrap_err();
        assert_eq!(
            err,
            TemplateError::WildcardNotLast {
                template: "/assets/*/logo".into()
            }
        );
        assert!(UriTemplate::parse(HttpMethod::Get, "/assets/*").is_ok());
    }

    #[test]
    fn test_literals_are_kept_verbatim() {
        let template = compile("/Users/**");
        assert_eq!(template.segments()[1], Segment::literal("Users"));
        assert_eq!(template.segments()[2], Segment::literal("**"));
    }

    #[test]
    fn test_canonical_form_is_stable() {
        for source in ["/", "/users/{int:id}/posts/*", "/a/{b}/{float:c}", "/files/{string:name}"] {
            let template = compile(source);
            let canonical = template.to_string();
            assert_eq!(canonical, source);
            let again = compile(&canonical);
            assert_eq!(again.segments(), template.segments());
        }
        assert_eq!(compile("users//list/").to_string(), "/users/list");
    }

    #[test]
    fn test_method_parsing_and_acceptance() {
        assert_eq!("get".parse::<HttpMethod>(), Ok(HttpMethod::Get));
        assert_eq!("ALL".parse::<HttpMethod>(), Ok(HttpMethod::All));
        assert!("PATCH".parse::<HttpMethod>().is_err());
        assert!(HttpMethod::All.accepts("PATCH"));
        assert!(HttpMethod::Post.accepts("POST"));
        assert!(!HttpMethod::Post.accepts("GET"));
    }

    #[test]
    fn test_normalize_mount() {
        assert_eq!(normalize_mount("/static/"), "/static/*");
        assert_eq!(normalize_mount("/favicon.ico"), "/favicon.ico");
        let template = compile(&normalize_mount("/static/"));
        assert_eq!(template.to_string(), "/static/*");
    }

    #[test]
    fn test_same_shape_ignores_names() {
        assert!(compile("/users/{int:id}").same_shape(&compile("/users/{int:uid}")));
        assert!(!compile("/users/{int:id}").same_shape(&compile("/users/{id}")));
        assert!(!compile("/users/{id}").same_shape(
            &UriTemplate::parse(HttpMethod::Post, "/users/{id}").unwrap()
        ));
        assert!(UriTemplate::parse(HttpMethod::All, "/users/{id}")
            .unwrap()
            .same_shape(&compile("/users/{name}")));
    }

    #[test]
    fn test_all_overlaps_every_method() {
        assert!(HttpMethod::All.overlaps(HttpMethod::Delete));
        assert!(HttpMethod::Put.overlaps(HttpMethod::All));
        assert!(HttpMethod::Get.overlaps(HttpMethod::Get));
        assert!(!HttpMethod::Get.overlaps(HttpMethod::Post));
    }
}
