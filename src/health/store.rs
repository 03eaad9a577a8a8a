//! Typed health store over the KV capability.
//!
//! # Responsibilities
//! - Own the key layout (`health:<id>`, `health:summary`, `failover:last`)
//! - Serialize/deserialize summaries and failover events
//! - Fail open: a broken store reads as Unknown, never aborts a request
//!
//! # Design Decisions
//! - Writers race benignly (prober vs router mark-down); entries are
//!   advisory hints, last-write-wins
//! - Every KV failure is logged at warn and swallowed

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::health::state::{FailoverEvent, HealthStatus, HealthSummary};
use crate::origin::OriginRegistry;
use crate::store::KvStore;

const HEALTH_PREFIX: &str = "health:";
const SUMMARY_KEY: &str = "health:summary";
const FAILOVER_KEY: &str = "failover:last";

/// How long a failover event is retained for diagnostics.
pub const FAILOVER_TTL: Duration = Duration::from_secs(86_400);

fn health_key(origin_id: &str) -> String {
    format!("{}{}", HEALTH_PREFIX, origin_id)
}

/// Shared health state, read by the router and written by the prober
/// and the router's mark-down side channel.
#[derive(Clone)]
pub struct HealthStore {
    kv: Arc<dyn KvStore>,
}

impl HealthStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Current status of one origin. Miss, expiry, garbage, and store
    /// failure all read as Unknown.
    pub fn status_of(&self, origin_id: &str) -> HealthStatus {
        match self.kv.get(&health_key(origin_id)) {
            Ok(raw) => HealthStatus::from_wire(raw.as_deref()),
            Err(e) => {
                tracing::warn!(origin = %origin_id, error = %e, "Health read failed, treating as unknown");
                HealthStatus::Unknown
            }
        }
    }

    /// Per-origin statuses for every registered origin.
    pub fn snapshot(&self, registry: &OriginRegistry) -> BTreeMap<String, HealthStatus> {
        registry
            .ordered()
            .iter()
            .map(|o| (o.id.clone(), self.status_of(&o.id)))
            .collect()
    }

    /// Record one origin's status with the given TTL.
    pub fn put_status(&self, origin_id: &str, status: HealthStatus, ttl: Duration) {
        if let Err(e) = self
            .kv
            .put(&health_key(origin_id), status.as_wire(), Some(ttl))
        {
            tracing::warn!(origin = %origin_id, error = %e, "Health write failed");
        }
    }

    /// Fast mark-down side channel used by the router on a proxy failure.
    pub fn mark_down(&self, origin_id: &str, ttl: Duration) {
        tracing::warn!(origin = %origin_id, "Marking origin down");
        self.put_status(origin_id, HealthStatus::Down, ttl);
    }

    /// Publish the whole-batch summary for one probe cycle.
    pub fn publish_summary(&self, summary: &HealthSummary, ttl: Duration) {
        match serde_json::to_string(summary) {
            Ok(json) => {
                if let Err(e) = self.kv.put(SUMMARY_KEY, &json, Some(ttl)) {
                    tracing::warn!(error = %e, "Summary write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Summary serialization failed"),
        }
    }

    /// Latest published summary, if one is still live.
    pub fn summary(&self) -> Option<HealthSummary> {
        let raw = match self.kv.get(SUMMARY_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Summary read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(error = %e, "Summary unreadable, ignoring");
                None
            }
        }
    }

    /// Record a failover event for diagnostics.
    pub fn record_failover(&self, event: &FailoverEvent) {
        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = self.kv.put(FAILOVER_KEY, &json, Some(FAILOVER_TTL)) {
                    tracing::warn!(error = %e, "Failover event write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failover event serialization failed"),
        }
    }

    /// Last recorded failover event, if still retained.
    pub fn last_failover(&self) -> Option<FailoverEvent> {
        let raw = match self.kv.get(FAILOVER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "Failover event read failed");
                return None;
            }
        };
        serde_json::from_str(&raw).ok()
    }
}
