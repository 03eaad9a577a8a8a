//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with per-request and per-origin fields
//! - Metrics are cheap (atomic increments behind the metrics facade)
//! - Request ID flows from the middleware through all log events

pub mod logging;
pub mod metrics;
