//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build registry/store → Spawn prober → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast to prober loop → axum graceful shutdown → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - One broadcast channel; every long-running task subscribes

pub mod shutdown;

pub use shutdown::Shutdown;
