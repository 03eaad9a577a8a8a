//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Prober (prober.rs):
//!     Interval tick
//!     → probe every origin concurrently (own timeout each)
//!     → per-origin records + batch summary into store.rs
//!
//! Router mark-down (http/forward.rs):
//!     Proxy attempt fails at the network level
//!     → detached mark_down write into store.rs
//!
//! Router reads (http/forward.rs):
//!     Per-origin records from store.rs, expiry → Unknown
//! ```
//!
//! # Design Decisions
//! - Both writers race benignly; records are advisory hints
//! - Unknown (absent/expired) is tried optimistically, only Down is skipped
//! - The store wrapper fails open so health-state freshness never
//!   outranks proxy availability

pub mod prober;
pub mod state;
pub mod store;

pub use prober::Prober;
pub use state::{FailoverEvent, HealthStatus, HealthSummary};
pub use store::HealthStore;
