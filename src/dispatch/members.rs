//! Chain member implementations.
//!
//! # Responsibilities
//! - Route members: resolve a request against a module's route table and
//!   invoke the matched handler with scoped bindings
//! - Asset fallback: serve files under configured mounts
//! - Not-found fallback: answer 404 when nothing else did
//!
//! # Design Decisions
//! - A route member that matches nothing passes the request on; no match is
//!   never an error
//! - Bindings last for one handler invocation; the enclosing scope is put
//!   back when it returns, including when it fails

use std::fs;
use std::path::{Path, PathBuf};

use axum::http::StatusCode;

use crate::dispatch::chain::{ChainMember, DispatchChain, DispatchError, Stage};
use crate::dispatch::context::RequestContext;
use crate::dispatch::handler::{HandlerResult, Invocable};
use crate::http::Response;
use crate::routing::{
    extract_bindings, normalize_mount, AnyMatcher, HttpMethod, Matcher, PathResource, RouteTable,
    TemplateError, UriTemplate,
};

/// Routes of one module wrapped as a chain member.
#[derive(Debug)]
pub struct RouteMember {
    name: String,
    stage: Stage,
    table: RouteTable<Invocable>,
}

impl RouteMember {
    pub fn new(name: impl Into<String>, stage: Stage, table: RouteTable<Invocable>) -> Self {
        Self {
            name: name.into(),
            stage,
            table,
        }
    }

    pub fn table(&self) -> &RouteTable<Invocable> {
        &self.table
    }
}

impl ChainMember for RouteMember {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn process(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        chain: &DispatchChain,
    ) -> Result<(), DispatchError> {
        let Some(entry) = self.table.resolve(ctx.method(), ctx.resource()) else {
            return chain.next(ctx, response);
        };

        tracing::debug!(
            member = %self.name,
            method = %entry.template.method(),
            route = %entry.template,
            priority = entry.priority,
            "Route matched"
        );

        let bindings = extract_bindings(ctx.resource(), &entry.template);
        let enclosing = ctx.replace_dynamic(bindings);
        let result = entry.handler.invoke(ctx, response, chain);
        ctx.replace_dynamic(enclosing);

        result.map_err(|e| {
            DispatchError::handler(format!("{} {}", entry.template.method(), entry.template), e)
        })
    }
}

type MemberFn =
    dyn Fn(&mut RequestContext, &mut Response, &DispatchChain) -> HandlerResult + Send + Sync;

/// A member backed by a plain closure, matched against every request.
pub struct FnMember {
    name: String,
    stage: Stage,
    handler: Box<MemberFn>,
}

impl FnMember {
    pub fn new<F>(name: impl Into<String>, stage: Stage, handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut Response, &DispatchChain) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            stage,
            handler: Box::new(handler),
        }
    }
}

impl ChainMember for FnMember {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn process(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        chain: &DispatchChain,
    ) -> Result<(), DispatchError> {
        (self.handler)(ctx, response, chain).map_err(|e| DispatchError::member(&self.name, e))
    }
}

/// Serves static files under a set of mounts.
///
/// Mounts are registered for every method. A mount ending in `/` covers
/// everything below it (`/static/` serves `/static/*`).
#[derive(Debug)]
pub struct AssetMounts {
    root: PathBuf,
    mounts: AnyMatcher<UriTemplate>,
}

impl AssetMounts {
    pub fn new(root: impl Into<PathBuf>, uri_mapping: &[String]) -> Result<Self, TemplateError> {
        let mounts = uri_mapping
            .iter()
            .map(|uri| {
                let mount = normalize_mount(uri);
                tracing::debug!(mount = %mount, "Asset mount defined");
                UriTemplate::parse(HttpMethod::All, &mount)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            root: root.into(),
            mounts: AnyMatcher::new(mounts),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mounts(&self) -> &[UriTemplate] {
        self.mounts.matchers()
    }

    /// Local file for a request resource. Dot segments never resolve.
    fn local_path(&self, resource: &PathResource) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in resource.relative() {
            if segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

impl ChainMember for AssetMounts {
    fn name(&self) -> &str {
        "assets"
    }

    fn stage(&self) -> Stage {
        Stage::Fallback
    }

    fn process(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        chain: &DispatchChain,
    ) -> Result<(), DispatchError> {
        if !self.mounts.matches(ctx.resource()) {
            return chain.next(ctx, response);
        }

        match self.local_path(ctx.resource()).filter(|p| p.is_file()) {
            Some(path) => {
                let data = fs::read(&path).map_err(|e| DispatchError::member("assets", Box::new(e)))?;
                tracing::debug!(path = %path.display(), bytes = data.len(), "Serving asset");
                response
                    .status(StatusCode::OK)
                    .content_type(content_type(&path))
                    .bytes(data);
            }
            None => {
                tracing::debug!(path = %ctx.path(), "Asset not found");
                response.status(StatusCode::NOT_FOUND);
            }
        }
        Ok(())
    }
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Final member: answers 404 unless some earlier member already answered.
#[derive(Debug, Default)]
pub struct NotFound;

impl ChainMember for NotFound {
    fn name(&self) -> &str {
        "not-found"
    }

    fn stage(&self) -> Stage {
        Stage::Fallback
    }

    fn process(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        _chain: &DispatchChain,
    ) -> Result<(), DispatchError> {
        if !response.is_committed() {
            tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No member answered");
            response.status(StatusCode::NOT_FOUND).text("Not Found");
        }
        Ok(())
    }
}
