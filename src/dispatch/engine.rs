//! Engine assembly and request entry point.
//!
//! # Responsibilities
//! - Collect route modules and custom members in registration order
//! - Compile every module's routes, failing fast on the first bad one
//! - Order the chain by stage and terminate it with the not-found fallback
//! - Run one request through the chain
//!
//! # Design Decisions
//! - Built once, immutable afterwards; a config reload builds a new engine
//! - Ordering is stable: within a stage, registration order is kept

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::dispatch::chain::{ChainMember, DispatchChain, DispatchError, Stage};
use crate::dispatch::context::RequestContext;
use crate::dispatch::handler::{RegistrationError, RouteModule, RouteRegistrar};
use crate::dispatch::members::{AssetMounts, NotFound, RouteMember};
use crate::http::{Request, Response};
use crate::routing::TemplateCompiler;

/// Compiled dispatch chain plus the mount point it serves.
#[derive(Debug)]
pub struct Engine {
    chain: DispatchChain,
    context_path: String,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Run a request through the chain and return whatever the members wrote.
    pub fn dispatch(&self, request: Request) -> Result<Response, DispatchError> {
        let span = tracing::debug_span!(
            "dispatch",
            method = %request.method(),
            path = %request.path(),
            request_id = request.request_id().unwrap_or("-")
        );
        let _enter = span.enter();

        let mut ctx = RequestContext::new(request);
        let mut response = Response::new();
        self.chain.run(&mut ctx, &mut response)?;

        tracing::debug!(status = ?response.status_code(), "Dispatch complete");
        Ok(response)
    }

    pub fn chain(&self) -> &DispatchChain {
        &self.chain
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }
}

enum Pending {
    Module(Stage, Arc<dyn RouteModule>),
    Member(Arc<dyn ChainMember>),
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    compiler: TemplateCompiler,
    context_path: String,
    pending: Vec<Pending>,
    assets: Option<(PathBuf, Vec<String>)>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            compiler: TemplateCompiler::default(),
            context_path: "/".to_string(),
            pending: Vec::new(),
            assets: None,
        }
    }
}

impl EngineBuilder {
    /// Start from the routing, listener and assets sections of a config.
    pub fn from_config(config: &DispatchConfig) -> Self {
        let builder = Self::default()
            .absolute_typing(config.routing.absolute_typing)
            .context_path(&config.listener.context_path);
        if config.assets.enabled {
            builder.assets(&config.assets.root, &config.assets.uri_mapping)
        } else {
            builder
        }
    }

    /// Compile untyped `{name}` segments as strings instead of "any".
    pub fn absolute_typing(mut self, enabled: bool) -> Self {
        self.compiler = TemplateCompiler::new(enabled);
        self
    }

    pub fn context_path(mut self, path: &str) -> Self {
        self.context_path = path.to_string();
        self
    }

    /// Interceptor that runs before content modules.
    pub fn before<M: RouteModule + 'static>(self, module: M) -> Self {
        self.staged(Stage::BeforeInterceptor, module)
    }

    pub fn module<M: RouteModule + 'static>(self, module: M) -> Self {
        self.staged(Stage::Content, module)
    }

    /// Interceptor that runs after content modules that passed the request on.
    pub fn after<M: RouteModule + 'static>(self, module: M) -> Self {
        self.staged(Stage::AfterInterceptor, module)
    }

    pub fn member(mut self, member: Arc<dyn ChainMember>) -> Self {
        self.pending.push(Pending::Member(member));
        self
    }

    /// Serve files under `root` for the given mounts.
    pub fn assets(mut self, root: impl Into<PathBuf>, uri_mapping: &[String]) -> Self {
        self.assets = Some((root.into(), uri_mapping.to_vec()));
        self
    }

    fn staged<M: RouteModule + 'static>(mut self, stage: Stage, module: M) -> Self {
        self.pending.push(Pending::Module(stage, Arc::new(module)));
        self
    }

    pub fn build(self) -> Result<Engine, RegistrationError> {
        let mut members: Vec<Arc<dyn ChainMember>> = Vec::with_capacity(self.pending.len() + 2);

        for pending in self.pending {
            match pending {
                Pending::Module(stage, module) => {
                    let mut routes =
                        RouteRegistrar::new(self.compiler, stage, module.name(), module.root());
                    if let Err(e) = module.register(&mut routes) {
                        tracing::error!(module = module.name(), error = %e, "Route registration failed");
                        return Err(e);
                    }
                    members.push(Arc::new(RouteMember::new(module.name(), stage, routes.into_table())));
                }
                Pending::Member(member) => members.push(member),
            }
        }

        if let Some((root, mapping)) = self.assets {
            members.push(Arc::new(AssetMounts::new(root, &mapping)?));
        }

        members.sort_by_key(|m| m.stage());
        members.push(Arc::new(NotFound));

        let chain = DispatchChain::new(members);
        tracing::info!(
            members = ?chain.member_names(),
            context_path = %self.context_path,
            absolute_typing = self.compiler.absolute_typing(),
            "Dispatch chain assembled"
        );

        Ok(Engine {
            chain,
            context_path: self.context_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::HandlerResult;
    use crate::dispatch::members::FnMember;
    use axum::http::StatusCode;

    struct Hello;

    impl RouteModule for Hello {
        fn name(&self) -> &str {
            "hello"
        }

        fn register(&self, routes: &mut RouteRegistrar) -> Result<(), RegistrationError> {
            routes.get("/hello/{name}", |ctx, response| {
                response.text(format!("hello {}", ctx.dynamic_or("name", "?")));
                Ok(())
            })?;
            Ok(())
        }
    }

    fn pass(ctx: &mut RequestContext, response: &mut Response, chain: &DispatchChain) -> HandlerResult {
        Ok(chain.next(ctx, response)?)
    }

    #[test]
    fn test_members_ordered_by_stage_then_registration() {
        let engine = Engine::builder()
            .member(Arc::new(FnMember::new("late", Stage::AfterInterceptor, pass)))
            .module(Hello)
            .member(Arc::new(FnMember::new("early", Stage::BeforeInterceptor, pass)))
            .member(Arc::new(FnMember::new("early-2", Stage::BeforeInterceptor, pass)))
            .build()
            .unwrap();
        assert_eq!(
            engine.chain().member_names(),
            vec!["early", "early-2", "hello", "late", "not-found"]
        );
    }

    #[test]
    fn test_dispatch_answers_and_falls_back() {
        let engine = Engine::builder().module(Hello).build().unwrap();

        let response = engine.dispatch(Request::new("GET", "/hello/bob")).unwrap();
        assert_eq!(response.status_code(), Some(StatusCode::OK));
        assert_eq!(response.body().as_ref(), b"hello bob");

        let response = engine.dispatch(Request::new("GET", "/bye")).unwrap();
        assert_eq!(response.status_code(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_from_config() {
        let mut config = DispatchConfig::default();
        config.listener.context_path = "/app".to_string();
        config.routing.absolute_typing = true;
        let engine = EngineBuilder::from_config(&config).build().unwrap();
        assert_eq!(engine.context_path(), "/app");
        assert_eq!(engine.chain().member_names(), vec!["not-found"]);
    }
}
