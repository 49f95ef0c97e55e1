//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config subsystem produces:
//!     → logging.rs (structured log events: source, path, change counts)
//!     → metrics.rs (reload outcomes, changed fields, callback outcomes)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder every update is a no-op
//! - Log level comes from RUST_LOG, falling back to a per-binary default

pub mod logging;
pub mod metrics;
