//! Handlers and route registration.
//!
//! # Responsibilities
//! - Define the two invocable shapes a route handler may take
//! - Define the registration capability a route module implements
//! - Compile and validate routes as modules register them
//!
//! # Design Decisions
//! - Routes are declared through explicit builder calls at startup; nothing
//!   is discovered at runtime
//! - Every registration problem surfaces from [`RouteModule::register`],
//!   never at first request
//! - Interceptor modules must use the chained shape, since an interceptor
//!   that cannot continue the chain would swallow every request it matches

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::chain::{DispatchChain, Stage};
use crate::dispatch::context::RequestContext;
use crate::http::Response;
use crate::routing::{join_path, HttpMethod, RouteTable, TemplateCompiler, TemplateError};

/// Error type returned by route handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<(), BoxError>;

type TerminalFn = dyn Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync;
type ChainedFn =
    dyn Fn(&mut RequestContext, &mut Response, &DispatchChain) -> HandlerResult + Send + Sync;

/// Calling convention of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocableShape {
    /// Sees the request and response only; always ends traversal.
    Terminal,
    /// Also receives the chain and may continue it.
    Chained,
}

impl fmt::Display for InvocableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvocableShape::Terminal => "terminal",
            InvocableShape::Chained => "chained",
        })
    }
}

/// A registered route handler.
#[derive(Clone)]
pub enum Invocable {
    Terminal(Arc<TerminalFn>),
    Chained(Arc<ChainedFn>),
}

impl Invocable {
    pub fn terminal<F>(handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        Invocable::Terminal(Arc::new(handler))
    }

    pub fn chained<F>(handler: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut Response, &DispatchChain) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        Invocable::Chained(Arc::new(handler))
    }

    pub fn shape(&self) -> InvocableShape {
        match self {
            Invocable::Terminal(_) => InvocableShape::Terminal,
            Invocable::Chained(_) => InvocableShape::Chained,
        }
    }

    pub fn invoke(
        &self,
        ctx: &mut RequestContext,
        response: &mut Response,
        chain: &DispatchChain,
    ) -> HandlerResult {
        match self {
            Invocable::Terminal(handler) => handler(ctx, response),
            Invocable::Chained(handler) => handler(ctx, response, chain),
        }
    }
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invocable::{:?}", self.shape())
    }
}

/// Errors raised while a module registers its routes.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The template string failed to compile.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The method is not one of GET, POST, PUT, DELETE or ALL.
    #[error("unsupported method `{method}` for route `{template}`")]
    UnsupportedMethod { method: String, template: String },

    /// The handler's calling convention cannot be used at this stage.
    #[error("route `{route}` in module `{module}` is {found}, but {stage} routes must be {required}")]
    UnsupportedInvocableShape {
        module: String,
        route: String,
        stage: Stage,
        found: InvocableShape,
        required: InvocableShape,
    },
}

/// Capability of a type that contributes routes to the engine.
pub trait RouteModule: Send + Sync {
    fn name(&self) -> &str;

    /// Prefix joined in front of every template this module registers.
    fn root(&self) -> &str {
        "/"
    }

    fn register(&self, routes: &mut RouteRegistrar) -> Result<(), RegistrationError>;
}

/// Collects the routes of one module into a [`RouteTable`].
#[derive(Debug)]
pub struct RouteRegistrar {
    compiler: TemplateCompiler,
    stage: Stage,
    module: String,
    root: String,
    table: RouteTable<Invocable>,
}

impl RouteRegistrar {
    pub fn new(compiler: TemplateCompiler, stage: Stage, module: &str, root: &str) -> Self {
        Self {
            compiler,
            stage,
            module: module.to_string(),
            root: root.to_string(),
            table: RouteTable::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Compile `root + template` and register it for `method`.
    pub fn route(
        &mut self,
        method: &str,
        template: &str,
        invocable: Invocable,
    ) -> Result<&mut Self, RegistrationError> {
        let full = join_path(&self.root, template);
        let method: HttpMethod = method.parse().map_err(|method| RegistrationError::UnsupportedMethod {
            method,
            template: full.clone(),
        })?;

        let required = self.required_shape();
        if required == InvocableShape::Chained && invocable.shape() != required {
            return Err(RegistrationError::UnsupportedInvocableShape {
                module: self.module.clone(),
                route: full,
                stage: self.stage,
                found: invocable.shape(),
                required,
            });
        }

        let compiled = self.compiler.compile(method, &full)?;
        tracing::info!(
            module = %self.module,
            stage = %self.stage,
            method = %method,
            route = %compiled,
            priority = compiled.priority(),
            shape = %invocable.shape(),
            "Route registered"
        );
        self.table.register(compiled, invocable);
        Ok(self)
    }

    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route("GET", template, Invocable::terminal(handler))
    }

    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route("POST", template, Invocable::terminal(handler))
    }

    pub fn put<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route("PUT", template, Invocable::terminal(handler))
    }

    pub fn delete<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route("DELETE", template, Invocable::terminal(handler))
    }

    pub fn all<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.route("ALL", template, Invocable::terminal(handler))
    }

    /// One handler under both GET and POST.
    pub fn get_post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        let invocable = Invocable::terminal(handler);
        self.route("GET", template, invocable.clone())?;
        self.route("POST", template, invocable)
    }

    /// Register a handler that receives the chain and may continue it.
    pub fn chained<F>(
        &mut self,
        method: &str,
        template: &str,
        handler: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&mut RequestContext, &mut Response, &DispatchChain) -> HandlerResult
            + Send
            + Sync
            + 'static,
    {
        self.route(method, template, Invocable::chained(handler))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn into_table(self) -> RouteTable<Invocable> {
        self.table
    }

    fn required_shape(&self) -> InvocableShape {
        match self.stage {
            Stage::BeforeInterceptor | Stage::AfterInterceptor => InvocableShape::Chained,
            Stage::Content | Stage::Fallback => InvocableShape::Terminal,
        }
    }
}
