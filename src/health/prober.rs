//! Background health prober.
//!
//! # Responsibilities
//! - Probe every origin concurrently on a fixed interval
//! - Publish per-origin records and a whole-batch summary
//!
//! # Design Decisions
//! - Fan-out/fan-in: one task per origin, each with its own timeout,
//!   so a slow or failing origin never blocks the rest of the batch
//! - A probe is Up when the origin answers below 500; timeout, refused
//!   connection and DNS failure are all Down
//! - No retries within a cycle; the next tick is the retry
//! - Record TTL is 10x the interval: a Down mark survives consecutive
//!   failing cycles, and every mark expires if the prober goes silent

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio::sync::broadcast;
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use axum::http::Request;
use axum::body::Body;

use crate::config::ProbeConfig;
use crate::health::state::{HealthStatus, HealthSummary};
use crate::health::store::HealthStore;
use crate::origin::{Origin, OriginRegistry};
use crate::observability::metrics;

const PROBE_USER_AGENT: &str = "failover-proxy-health-check/1.0";

/// Recurring health checker for every registered origin.
pub struct Prober {
    registry: Arc<OriginRegistry>,
    health: HealthStore,
    config: ProbeConfig,
    client: Client<HttpConnector, Body>,
}

impl Prober {
    pub fn new(registry: Arc<OriginRegistry>, health: HealthStore, config: ProbeConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            health,
            config,
            client,
        }
    }

    /// TTL applied to per-origin records and the summary.
    fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.config.interval_secs * 10)
    }

    /// Run the probe loop until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Health probing disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            origins = self.registry.len(),
            "Prober starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One probe cycle: fan out to every origin, then publish the batch.
    ///
    /// Public so a scheduled external trigger (or a test) can drive a
    /// cycle without the interval loop.
    pub async fn run_cycle(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let probes = self.registry.ordered().iter().map(|origin| {
            let client = self.client.clone();
            let origin = origin.clone();
            // Spawned so one hung or panicking probe cannot take the
            // batch down with it
            tokio::spawn(async move {
                let status = probe_origin(&client, &origin, timeout).await;
                (origin.id, status)
            })
        });

        let mut statuses = BTreeMap::new();
        for result in join_all(probes).await {
            match result {
                Ok((id, status)) => {
                    statuses.insert(id, status);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Probe task failed");
                }
            }
        }

        let ttl = self.record_ttl();
        for (id, status) in &statuses {
            self.health.put_status(id, *status, ttl);
            metrics::record_origin_health(id, *status == HealthStatus::Up);
        }

        let summary = HealthSummary::new(statuses);
        self.health.publish_summary(&summary, ttl);
        metrics::record_probe_cycle();

        tracing::info!(
            origins = ?summary.origins,
            "Health check complete"
        );
    }
}

/// Probe a single origin with its own timeout.
async fn probe_origin(
    client: &Client<HttpConnector, Body>,
    origin: &Origin,
    timeout: Duration,
) -> HealthStatus {
    let request = match Request::builder()
        .method("HEAD")
        .uri(origin.health_url())
        .header("user-agent", PROBE_USER_AGENT)
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(origin = %origin.id, error = %e, "Failed to build probe request");
            return HealthStatus::Down;
        }
    };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            if response.status().as_u16() < 500 {
                HealthStatus::Up
            } else {
                tracing::warn!(origin = %origin.id, status = %response.status(), "Probe failed: server error");
                HealthStatus::Down
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(origin = %origin.id, error = %e, "Probe failed: connection error");
            HealthStatus::Down
        }
        Err(_) => {
            tracing::warn!(origin = %origin.id, "Probe failed: timeout");
            HealthStatus::Down
        }
    }
}
