//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at registration):
//!     method + template string
//!     → template.rs (split, classify segments, validate)
//!     → priority.rs (rank the compiled segments)
//!     → table.rs (append entry, warn on shadowing)
//!
//! Incoming Request (method, decoded path):
//!     → resource.rs (split path, infer segment types)
//!     → table.rs (filter by method)
//!     → matcher.rs (segment-wise comparison, bindings)
//!     → Return: best RouteEntry or None
//! ```
//!
//! # Design Decisions
//! - Templates compiled once, immutable at runtime
//! - No regex anywhere: literal compare plus type inference
//! - Deterministic: same input always selects the same route
//! - Highest priority wins; ties go to the earliest registration

pub mod matcher;
pub mod priority;
pub mod resource;
pub mod table;
pub mod template;

pub use matcher::{extract_bindings, matches, AnyMatcher, DynamicParams, Matcher};
pub use resource::{infer_type, join_path, split_path, PathResource, ROOT_SEGMENT};
pub use table::{RouteEntry, RouteTable};
pub use template::{
    normalize_mount, HttpMethod, Segment, TemplateCompiler, TemplateError, UriTemplate, ValueType,
};
