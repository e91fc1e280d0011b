//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, trace, timeout layers)
//!     → body buffered within limits.max_body_bytes
//!     → request.rs (method, decoded path minus context path, query)
//!     → [dispatch engine on the blocking pool]
//!     → response.rs (status, headers, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, X_REQUEST_ID};
pub use response::Response;
pub use server::{AppState, EngineFactory, HttpServer};
