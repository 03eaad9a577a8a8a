//! Health state types and wire formats.
//!
//! # States
//! - Up: origin answered its last probe with a non-5xx status
//! - Down: probe or proxy attempt failed at the network level, or 5xx
//! - Unknown: never probed, record expired, or record unreadable
//!
//! # Design Decisions
//! - Unknown is routable: the router tries it optimistically
//! - Records are advisory hints; last-write-wins between the prober
//!   and the router's mark-down side channel is acceptable
//! - Stored as the strings "up"/"down"; anything else reads as Unknown

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};

/// Per-origin health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Unknown,
}

impl HealthStatus {
    /// Parse the stored wire value. Missing or garbage values are Unknown.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            Some("up") => HealthStatus::Up,
            Some("down") => HealthStatus::Down,
            _ => HealthStatus::Unknown,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            HealthStatus::Up => "up",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Routable means the router will attempt this origin on the fast path.
    pub fn is_routable(&self) -> bool {
        !matches!(self, HealthStatus::Down)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One probe cycle's view of every origin, written atomically per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Unix seconds at publish time.
    pub ts: u64,
    /// Origin id → status for the whole batch.
    pub origins: BTreeMap<String, HealthStatus>,
}

impl HealthSummary {
    pub fn new(origins: BTreeMap<String, HealthStatus>) -> Self {
        Self {
            ts: unix_now(),
            origins,
        }
    }

    pub fn status_of(&self, origin_id: &str) -> HealthStatus {
        self.origins
            .get(origin_id)
            .copied()
            .unwrap_or(HealthStatus::Unknown)
    }
}

/// Recorded when a response was served by a tier other than tier 1.
/// Diagnostic only; never read on the request path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverEvent {
    /// Unix seconds at serve time.
    pub ts: u64,
    /// Origin that actually served the request.
    pub serving: String,
    /// Tier of the serving origin.
    pub tier: u32,
    /// Health state the router saw when it made the decision.
    pub state: BTreeMap<String, HealthStatus>,
}

impl FailoverEvent {
    pub fn new(serving: impl Into<String>, tier: u32, state: BTreeMap<String, HealthStatus>) -> Self {
        Self {
            ts: unix_now(),
            serving: serving.into(),
            tier,
            state,
        }
    }
}

/// Seconds since the unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        assert_eq!(HealthStatus::from_wire(Some("up")), HealthStatus::Up);
        assert_eq!(HealthStatus::from_wire(Some("down")), HealthStatus::Down);
        assert_eq!(HealthStatus::from_wire(None), HealthStatus::Unknown);
        assert_eq!(HealthStatus::from_wire(Some("flaky")), HealthStatus::Unknown);
    }

    #[test]
    fn test_unknown_is_routable() {
        assert!(HealthStatus::Up.is_routable());
        assert!(HealthStatus::Unknown.is_routable());
        assert!(!HealthStatus::Down.is_routable());
    }

    #[test]
    fn test_summary_defaults_to_unknown() {
        let mut origins = BTreeMap::new();
        origins.insert("pi-fleet".to_string(), HealthStatus::Up);
        let summary = HealthSummary::new(origins);

        assert_eq!(summary.status_of("pi-fleet"), HealthStatus::Up);
        assert_eq!(summary.status_of("droplet"), HealthStatus::Unknown);
    }

    #[test]
    fn test_summary_serializes_lowercase() {
        let mut origins = BTreeMap::new();
        origins.insert("a".to_string(), HealthStatus::Down);
        let summary = HealthSummary::new(origins);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"a\":\"down\""));
    }
}
