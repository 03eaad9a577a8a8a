//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, diagnostic route)
//!     → request.rs (add request ID)
//!     → forward.rs (tier walk: skip Down, attempt, fall back)
//!     → response.rs (tier/origin tagging, maintenance page)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use request::RequestIdLayer;
pub use server::HttpServer;
