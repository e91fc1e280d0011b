//! Per-request dispatch state.
//!
//! # Responsibilities
//! - Own the request, its parsed path resource and the chain cursor
//! - Hold the dynamic-parameter bindings of the member currently running
//!
//! # Design Decisions
//! - One context per in-flight request, moved through the chain by `&mut`;
//!   nothing here is shared between requests or bound to a thread
//! - Bindings are replaced wholesale before a matched handler runs and the
//!   enclosing scope is put back when it returns: a later member never sees
//!   stale values, and a chained handler keeps its own after `next`

use std::str::FromStr;

use crate::http::Request;
use crate::routing::{DynamicParams, PathResource};

#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    resource: PathResource,
    dynamic: DynamicParams,
    cursor: usize,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        let resource = PathResource::parse(request.path());
        Self {
            request,
            resource,
            dynamic: DynamicParams::new(),
            cursor: 0,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn method(&self) -> &str {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn resource(&self) -> &PathResource {
        &self.resource
    }

    /// Raw value bound to a dynamic segment of the matched template.
    pub fn dynamic(&self, name: &str) -> Option<&str> {
        self.dynamic.get(name).map(String::as_str)
    }

    pub fn dynamic_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.dynamic(name).unwrap_or(default)
    }

    /// Parse a binding. An absent binding is `Ok(None)`.
    pub fn dynamic_as<T: FromStr>(&self, name: &str) -> Result<Option<T>, T::Err> {
        self.dynamic(name).map(str::parse::<T>).transpose()
    }

    pub fn dynamic_params(&self) -> &DynamicParams {
        &self.dynamic
    }

    /// Index of the next chain member to run.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    /// Install `bindings`, handing back the scope they replace.
    pub(crate) fn replace_dynamic(&mut self, bindings: DynamicParams) -> DynamicParams {
        std::mem::replace(&mut self.dynamic, bindings)
    }

    pub(crate) fn clear_dynamic(&mut self) {
        self.dynamic.clear();
    }

    /// Claim the member at the cursor and move past it, or `None` once the
    /// chain of `len` members is exhausted.
    pub(crate) fn advance(&mut self, len: usize) -> Option<usize> {
        if self.cursor >= len {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;
        Some(index)
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(path: &str) -> RequestContext {
        RequestContext::new(Request::new("GET", path))
    }

    #[test]
    fn test_resource_follows_request_path() {
        let ctx = context("/users/42");
        assert_eq!(ctx.resource().segments(), &["/", "users", "42"]);
        assert_eq!(ctx.method(), "GET");
    }

    #[test]
    fn test_bindings_are_replaced_not_merged() {
        let mut ctx = context("/");
        ctx.replace_dynamic(DynamicParams::from([("id".into(), "42".into())]));
        ctx.replace_dynamic(DynamicParams::from([("n".into(), "bob".into())]));
        assert_eq!(ctx.dynamic("id"), None);
        assert_eq!(ctx.dynamic("n"), Some("bob"));
    }

    #[test]
    fn test_replaced_scope_can_be_restored() {
        let mut ctx = context("/");
        let outer = ctx.replace_dynamic(DynamicParams::from([("id".into(), "42".into())]));
        assert!(outer.is_empty());

        let previous = ctx.replace_dynamic(DynamicParams::from([("key".into(), "7".into())]));
        assert_eq!(ctx.dynamic("id"), None);
        ctx.replace_dynamic(previous);
        assert_eq!(ctx.dynamic("id"), Some("42"));
        assert_eq!(ctx.dynamic("key"), None);
    }

    #[test]
    fn test_cleared_binding_reads_absent() {
        let mut ctx = context("/");
        ctx.replace_dynamic(DynamicParams::from([("id".into(), "42".into())]));
        ctx.clear_dynamic();
        assert_eq!(ctx.dynamic("id"), None);
        assert_eq!(ctx.dynamic_or("id", "none"), "none");
        assert!(ctx.dynamic_params().is_empty());
    }

    #[test]
    fn test_typed_binding_access() {
        let mut ctx = context("/");
        ctx.replace_dynamic(DynamicParams::from([
            ("id".into(), "42".into()),
            ("name".into(), "bob".into()),
        ]));
        assert_eq!(ctx.dynamic_as::<i64>("id"), Ok(Some(42)));
        assert_eq!(ctx.dynamic_as::<i64>("missing"), Ok(None));
        assert!(ctx.dynamic_as::<i64>("name").is_err());
    }

    #[test]
    fn test_cursor_stops_at_end() {
        let mut ctx = context("/");
        assert_eq!(ctx.advance(2), Some(0));
        assert_eq!(ctx.advance(2), Some(1));
        assert_eq!(ctx.advance(2), None);
        assert_eq!(ctx.advance(2), None);
        assert_eq!(ctx.position(), 2);
        ctx.reset_cursor();
        assert_eq!(ctx.advance(2), Some(0));
    }
}
