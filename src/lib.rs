//! HTTP route matching and dispatch engine.

pub mod config;
pub mod demo;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::DispatchConfig;
pub use dispatch::{Engine, EngineBuilder, RequestContext, RouteModule, RouteRegistrar};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
