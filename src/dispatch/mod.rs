//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteModule::register (explicit builder calls)
//!     → handler.rs (RouteRegistrar: compile, shape check)
//!     → members.rs (one RouteMember per module)
//!     → engine.rs (order by stage, append NotFound)
//!
//! Per request:
//!     Request
//!     → context.rs (RequestContext: resource, cursor, bindings)
//!     → chain.rs (run → next → member.process → next ...)
//!     → members.rs (resolve route, scope bindings, invoke handler)
//!     → Response (or DispatchError to the transport)
//! ```
//!
//! # Design Decisions
//! - Chain order: before-interceptors, content, after-interceptors, fallbacks
//! - All per-request state travels in the context, never in the chain
//! - A member answers by not calling `next`

pub mod chain;
pub mod context;
pub mod engine;
pub mod handler;
pub mod members;

pub use chain::{ChainMember, DispatchChain, DispatchError, Stage};
pub use context::RequestContext;
pub use engine::{Engine, EngineBuilder};
pub use handler::{
    BoxError, HandlerResult, Invocable, InvocableShape, RegistrationError, RouteModule,
    RouteRegistrar,
};
pub use members::{AssetMounts, FnMember, NotFound, RouteMember};
