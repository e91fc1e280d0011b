//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router that feeds every request to the engine
//! - Wire up middleware (tracing, request ID, timeout)
//! - Buffer bodies within the configured limit
//! - Run the synchronous engine off the async workers
//! - Swap in a freshly built engine when the config changes
//!
//! # Design Decisions
//! - One catch-all route; all routing happens inside the engine
//! - The engine lives behind `ArcSwap`: each request loads it once and keeps
//!   that engine until it finishes, even if a reload happens meanwhile
//! - Dispatch failures and panicking handlers become 500 responses
//! - Body buffering failures keep axum's status: 413 past the limit, 400
//!   for anything else (client abort, broken framing)
//! - Listener settings, timeouts and body limits apply at startup only;
//!   a reload rebuilds the engine

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{request::Parts, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::DispatchConfig;
use crate::dispatch::{Engine, RegistrationError};
use crate::http::request::{Request, X_REQUEST_ID};
use crate::observability::metrics;

/// Builds an engine from a configuration. Called at startup and on reload.
pub type EngineFactory =
    Arc<dyn Fn(&DispatchConfig) -> Result<Engine, RegistrationError> + Send + Sync>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ArcSwap<Engine>>,
}

/// UUID v4 request ids for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
struct MakeDispatchId;

impl MakeRequestId for MakeDispatchId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// HTTP front end for the dispatch engine.
pub struct HttpServer {
    router: Router,
    engine: Arc<ArcSwap<Engine>>,
    factory: EngineFactory,
    config: DispatchConfig,
}

impl HttpServer {
    /// Build the initial engine and the router around it.
    pub fn new(config: DispatchConfig, factory: EngineFactory) -> Result<Self, RegistrationError> {
        let engine = Arc::new(ArcSwap::from_pointee(factory(&config)?));
        let state = AppState {
            engine: engine.clone(),
        };
        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            engine,
            factory,
            config,
        })
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatchConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeDispatchId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// A clone of the router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn engine(&self) -> Arc<ArcSwap<Engine>> {
        self.engine.clone()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Rebuild the engine from `config` and swap it in.
    pub fn reload(&self, config: &DispatchConfig) -> Result<(), RegistrationError> {
        swap_engine(&self.engine, &self.factory, config)
    }

    /// Serve until `shutdown` fires, applying config updates as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut updates: mpsc::UnboundedReceiver<DispatchConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            context_path = %self.engine.load().context_path(),
            "HTTP server starting"
        );

        let engine = self.engine.clone();
        let factory = self.factory.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = updates.recv().await {
                // Failure is logged inside; the running engine stays.
                let _ = swap_engine(&engine, &factory, &config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn swap_engine(
    engine: &ArcSwap<Engine>,
    factory: &EngineFactory,
    config: &DispatchConfig,
) -> Result<(), RegistrationError> {
    match factory(config) {
        Ok(next) => {
            engine.store(Arc::new(next));
            metrics::record_reload("applied");
            tracing::info!(context_path = %config.listener.context_path, "Engine reloaded");
            Ok(())
        }
        Err(e) => {
            metrics::record_reload("rejected");
            tracing::error!(error = %e, "Engine rebuild failed, keeping current engine");
            Err(e)
        }
    }
}

/// Catch-all handler: dispatch the buffered request on the blocking pool.
async fn dispatch_handler(
    State(state): State<AppState>,
    parts: Parts,
    body: Result<Bytes, BytesRejection>,
) -> axum::response::Response {
    let start = Instant::now();
    let method = parts.method.to_string();

    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let status = rejection.status();
            tracing::warn!(
                method = %method,
                path = %parts.uri.path(),
                status = status.as_u16(),
                error = %rejection.body_text(),
                "Request body rejected"
            );
            metrics::record_dispatch(&method, status.as_u16(), start);
            return rejection.into_response();
        }
    };

    let engine = state.engine.load_full();
    let request = Request::from_http(&parts, bytes, engine.context_path());
    let path = request.path().to_string();

    let response = match tokio::task::spawn_blocking(move || engine.dispatch(request)).await {
        Ok(Ok(response)) => response.into_http(),
        Ok(Err(e)) => {
            tracing::error!(method = %method, path = %path, error = %e, "Dispatch failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Dispatch task aborted");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };

    metrics::record_dispatch(&method, response.status().as_u16(), start);
    response
}
