//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the failover proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ranked origin definitions. Tier order is the fallback order.
    pub origins: Vec<OriginConfig>,

    /// Health probe settings.
    pub probe: ProbeConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One candidate backend, ranked by tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin identifier (used as the health record key).
    pub id: String,

    /// Human-readable label for headers and the status page.
    #[serde(default)]
    pub label: String,

    /// Base URL requests are forwarded to (e.g., "http://10.0.0.4:3000").
    pub url: String,

    /// Path probed for health checks.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Fallback rank; tier 1 is primary. Must be unique and positive.
    pub tier: u32,
}

fn default_health_path() -> String {
    "/health".to_string()
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Enable the background prober.
    pub enabled: bool,

    /// Probe cycle interval in seconds.
    pub interval_secs: u64,

    /// Per-origin probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
            timeout_secs: 4,
        }
    }
}

/// Timeout configuration for various operations.
///
/// There is deliberately no total-request timeout: the tier walk makes
/// at most one attempt per origin, so its worst case is already bounded
/// by `origins × upstream_secs`. An outer budget shorter than that
/// would cut the walk off before every origin had its attempt.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt upstream call timeout in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { upstream_secs: 8 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address the metrics endpoint listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
