//! Route modules served by the `route-dispatch` binary.
//!
//! # Routes
//! - `ALL /*` access log (before-interceptor, logs after the chain returns)
//! - `GET /health`
//! - `GET /users/{int:id}`, `DELETE /users/{int:id}`
//! - `GET /users/by-name/{name}`
//! - `GET|POST /users/search?q=`
//!
//! # Design Decisions
//! - An untyped `{name}` outranks both literals and typed segments at the
//!   same depth, so the name lookup sits one level deeper than the others

use std::time::Instant;

use axum::http::StatusCode;
use serde_json::json;

use crate::config::DispatchConfig;
use crate::dispatch::{Engine, EngineBuilder, RegistrationError, RouteModule, RouteRegistrar};

/// Logs every request after the rest of the chain has handled it.
pub struct AccessLog;

impl RouteModule for AccessLog {
    fn name(&self) -> &str {
        "access-log"
    }

    fn register(&self, routes: &mut RouteRegistrar) -> Result<(), RegistrationError> {
        routes.chained("ALL", "/*", |ctx, response, chain| {
            let start = Instant::now();
            chain.next(ctx, response)?;
            tracing::info!(
                method = %ctx.method(),
                path = %ctx.path(),
                status = ?response.status_code(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "Request handled"
            );
            Ok(())
        })?;
        Ok(())
    }
}

pub struct Status;

impl RouteModule for Status {
    fn name(&self) -> &str {
        "status"
    }

    fn register(&self, routes: &mut RouteRegistrar) -> Result<(), RegistrationError> {
        routes.get("/health", |_, response| {
            response.json(&json!({ "status": "ok" }))?;
            Ok(())
        })?;
        Ok(())
    }
}

pub struct Users;

impl RouteModule for Users {
    fn name(&self) -> &str {
        "users"
    }

    fn root(&self) -> &str {
        "/users"
    }

    fn register(&self, routes: &mut RouteRegistrar) -> Result<(), RegistrationError> {
        routes
            .get("/{int:id}", |ctx, response| {
                let id = ctx.dynamic_as::<i64>("id")?.unwrap_or_default();
                response.json(&json!({ "id": id }))?;
                Ok(())
            })?
            .get("/by-name/{name}", |ctx, response| {
                response.json(&json!({ "name": ctx.dynamic_or("name", "") }))?;
                Ok(())
            })?
            .get_post("/search", |ctx, response| {
                let query = ctx.request().param("q").unwrap_or_default().to_string();
                response.json(&json!({ "query": query }))?;
                Ok(())
            })?
            .delete("/{int:id}", |_, response| {
                response.status(StatusCode::NO_CONTENT);
                Ok(())
            })?;
        Ok(())
    }
}

/// Engine factory for the server binary; also used on every config reload.
pub fn build_engine(config: &DispatchConfig) -> Result<Engine, RegistrationError> {
    EngineBuilder::from_config(config)
        .before(AccessLog)
        .module(Status)
        .module(Users)
        .build()
}
