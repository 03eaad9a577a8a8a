//! Tiered failover reverse proxy library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod report;
pub mod store;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
