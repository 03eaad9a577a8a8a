//! Health reporting.
//!
//! # Responsibilities
//! - Render the latest health summary and last failover event
//! - Serve both machine (JSON) and human (HTML) consumers
//!
//! # Design Decisions
//! - Pure rendering: reads nothing, writes nothing, holds no state
//! - A missing summary renders as "never checked" with every origin
//!   Unknown rather than an error

use std::collections::BTreeMap;
use serde::Serialize;

use crate::health::state::{FailoverEvent, HealthStatus, HealthSummary};
use crate::origin::OriginRegistry;

/// JSON shape of the diagnostic endpoint.
#[derive(Debug, Serialize)]
pub struct DiagnosticSnapshot {
    /// Unix seconds of the last completed probe cycle, if any.
    pub last_check_ts: Option<u64>,
    /// Origin id → status, for every registered origin.
    pub origins: BTreeMap<String, HealthStatus>,
    /// Last recorded failover, if still retained.
    pub last_failover: Option<FailoverEvent>,
}

/// Assemble the snapshot from the latest summary and failover event.
pub fn snapshot(
    registry: &OriginRegistry,
    summary: Option<&HealthSummary>,
    last_failover: Option<FailoverEvent>,
) -> DiagnosticSnapshot {
    let origins = registry
        .ordered()
        .iter()
        .map(|o| {
            let status = summary
                .map(|s| s.status_of(&o.id))
                .unwrap_or(HealthStatus::Unknown);
            (o.id.clone(), status)
        })
        .collect();

    DiagnosticSnapshot {
        last_check_ts: summary.map(|s| s.ts),
        origins,
        last_failover,
    }
}

/// Render the human-readable status page.
pub fn render_status_page(
    registry: &OriginRegistry,
    summary: Option<&HealthSummary>,
    last_failover: Option<&FailoverEvent>,
) -> String {
    let last_check = summary
        .map(|s| s.ts.to_string())
        .unwrap_or_else(|| "never".to_string());
    let last_failover_line = last_failover
        .map(|f| format!("Last failover: tier {} ({}) at {}", f.tier, f.serving, f.ts))
        .unwrap_or_else(|| "No failovers recorded".to_string());

    let rows: String = registry
        .ordered()
        .iter()
        .map(|o| {
            let status = summary
                .map(|s| s.status_of(&o.id))
                .unwrap_or(HealthStatus::Unknown);
            format!(
                "<tr><td>Tier {}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>",
                o.tier, o.label, o.base_url, status, status
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Failover Status</title>
<style>
  body{{font-family:monospace;padding:2rem}}
  table{{border-collapse:collapse;width:100%}}
  th,td{{padding:8px 12px;border:1px solid #ccc;text-align:left}}
  .up{{color:green}}
  .down{{color:red}}
  .unknown{{color:gray}}
  .ts{{color:#666;font-size:.8em}}
</style>
</head>
<body>
  <h1>Failover Status</h1>
  <p class="ts">Last check: {last_check} | {last_failover_line}</p>
  <table>
    <tr><th>Tier</th><th>Name</th><th>URL</th><th>Status</th></tr>
    {rows}
  </table>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OriginConfig;

    fn registry() -> OriginRegistry {
        OriginRegistry::from_config(&[
            OriginConfig {
                id: "primary".to_string(),
                label: "Primary".to_string(),
                url: "http://127.0.0.1:3001".to_string(),
                health_path: "/health".to_string(),
                tier: 1,
            },
            OriginConfig {
                id: "mirror".to_string(),
                label: "Mirror".to_string(),
                url: "http://127.0.0.1:3002".to_string(),
                health_path: "/health".to_string(),
                tier: 2,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_snapshot_covers_every_origin() {
        let registry = registry();
        let mut origins = BTreeMap::new();
        origins.insert("primary".to_string(), HealthStatus::Down);
        let summary = HealthSummary::new(origins);

        let snap = snapshot(&registry, Some(&summary), None);
        assert_eq!(snap.origins["primary"], HealthStatus::Down);
        // Not in the summary → unknown, still listed
        assert_eq!(snap.origins["mirror"], HealthStatus::Unknown);
        assert_eq!(snap.last_check_ts, Some(summary.ts));
    }

    #[test]
    fn test_snapshot_without_summary() {
        let registry = registry();
        let snap = snapshot(&registry, None, None);
        assert_eq!(snap.last_check_ts, None);
        assert!(snap.origins.values().all(|s| *s == HealthStatus::Unknown));
    }

    #[test]
    fn test_status_page_lists_tiers() {
        let registry = registry();
        let mut origins = BTreeMap::new();
        origins.insert("primary".to_string(), HealthStatus::Up);
        origins.insert("mirror".to_string(), HealthStatus::Down);
        let summary = HealthSummary::new(origins);

        let html = render_status_page(&registry, Some(&summary), None);
        assert!(html.contains("Tier 1"));
        assert!(html.contains("Tier 2"));
        assert!(html.contains("No failovers recorded"));
        assert!(html.contains(r#"class="down">down"#));
    }
}
