//! Origin management subsystem.
//!
//! # Design Decisions
//! - Origins are defined at startup and never mutated
//! - Tier uniqueness is a configuration-time invariant, not a runtime check

pub mod registry;

pub use registry::{Origin, OriginRegistry};
