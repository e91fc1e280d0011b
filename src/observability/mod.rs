//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing and dispatch produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (per-dispatch counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the transport layers and the dispatch span
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
