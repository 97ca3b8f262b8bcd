//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Store and reload subsystems produce:
//!     → tracing events (load, reload, save, per-key writes at debug)
//!     → metrics.rs (reload/save outcomes, poll ticks, tree size)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, filtered by RUST_LOG)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder on its own
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
