//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding core and host:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms; host only)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is set on entry and echoed on the response
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
