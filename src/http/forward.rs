//! Tiered failover forwarding.
//!
//! # Responsibilities
//! - Walk origins strictly in tier order, skipping known-Down ones
//! - Detect mid-flight failure and advance to the next tier
//! - Tag the winning response and record failovers
//!
//! # Design Decisions
//! - Unknown is attempted optimistically; only Down is skipped
//! - If every origin is marked Down the walk still attempts them all,
//!   in order: the proxy never strands a request without one attempt
//! - A network-level failure marks the origin Down through a detached
//!   task so the current request is never blocked on the write
//! - No retry against the same origin within a single client request
//! - A 5xx from the last untainted candidate is returned as-is rather
//!   than silently swallowed

use std::net::IpAddr;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, HeaderValue, Method, Request, Response};
use thiserror::Error;
use tokio::time;

use crate::http::request::X_REQUEST_ID;
use crate::http::response::{maintenance_page, tag_response};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::origin::Origin;

/// Per-attempt upstream failure. Always handled by advancing the walk;
/// never propagated to the client.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("upstream call timed out")]
    Timeout,
    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

/// Try origins in tier order until one produces an acceptable response.
pub async fn forward_with_failover(
    state: &AppState,
    parts: &Parts,
    body: Option<&Bytes>,
    client_ip: Option<IpAddr>,
    request_id: &str,
) -> Response<Body> {
    let start = Instant::now();
    let snapshot = state.health.snapshot(&state.registry);

    let routable: Vec<&Origin> = state
        .registry
        .ordered()
        .iter()
        .filter(|o| snapshot.get(&o.id).is_none_or(|s| s.is_routable()))
        .collect();

    // Every origin marked Down: attempt them all anyway, in order.
    let salvage = routable.is_empty();
    let candidates: Vec<&Origin> = if salvage {
        state.registry.ordered().iter().collect()
    } else {
        routable
    };

    let upstream_timeout = Duration::from_secs(state.timeouts.upstream_secs);
    // A router-observed failure is re-tried after one probe interval
    let mark_down_ttl = Duration::from_secs(state.probe.interval_secs);
    let last = candidates.len() - 1;

    for (i, origin) in candidates.iter().enumerate() {
        let request = match build_upstream_request(origin, parts, body, client_ip, request_id) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(request_id = %request_id, origin = %origin.id, error = %e, "Failed to build upstream request");
                continue;
            }
        };

        match attempt(state, request, upstream_timeout).await {
            Ok(response) => {
                let status = response.status();
                // Fallback-of-last-resort: a server error from the final
                // untainted candidate is still better than nothing
                if status.as_u16() < 500 || (i == last && !salvage) {
                    metrics::record_request(
                        parts.method.as_str(),
                        status.as_u16(),
                        &origin.id,
                        start,
                    );
                    if origin.tier > 1 {
                        record_failover(state, origin, &snapshot, request_id);
                    }
                    let (resp_parts, resp_body) = response.into_parts();
                    let mut response = Response::from_parts(resp_parts, Body::new(resp_body));
                    tag_response(&mut response, origin);
                    return response;
                }

                tracing::warn!(
                    request_id = %request_id,
                    origin = %origin.id,
                    tier = origin.tier,
                    status = %status,
                    "Origin answered with server error, falling back"
                );
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    origin = %origin.id,
                    tier = origin.tier,
                    error = %e,
                    "Upstream attempt failed, falling back"
                );
                // Detached mark-down so future requests skip this origin
                // without waiting out its request timeout
                let health = state.health.clone();
                let id = origin.id.clone();
                tokio::spawn(async move {
                    health.mark_down(&id, mark_down_ttl);
                });
            }
        }
    }

    tracing::error!(request_id = %request_id, "All origins exhausted, serving maintenance page");
    metrics::record_request(parts.method.as_str(), 503, "none", start);
    maintenance_page()
}

/// One upstream call, bounded by its own hard timeout.
async fn attempt(
    state: &AppState,
    request: Request<Body>,
    timeout: Duration,
) -> Result<Response<hyper::body::Incoming>, AttemptError> {
    match time::timeout(timeout, state.client.request(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(AttemptError::Transport(e)),
        Err(_) => Err(AttemptError::Timeout),
    }
}

/// Rebuild the inbound request for one origin.
///
/// Headers are forwarded verbatim except `host` (derived from the
/// target URL) and the forwarding metadata added here. GET and HEAD
/// never carry a body.
fn build_upstream_request(
    origin: &Origin,
    parts: &Parts,
    body: Option<&Bytes>,
    client_ip: Option<IpAddr>,
    request_id: &str,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut builder = Request::builder()
        .method(parts.method.clone())
        .uri(origin.target_url(path_and_query));

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            if name == axum::http::header::HOST {
                continue;
            }
            headers.insert(name.clone(), value.clone());
        }

        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(X_REQUEST_ID, value);
        }

        if let Some(ip) = client_ip {
            let forwarded = match parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
            {
                Some(existing) => format!("{}, {}", existing, ip),
                None => ip.to_string(),
            };
            if let Ok(value) = HeaderValue::from_str(&forwarded) {
                headers.insert("x-forwarded-for", value);
            }
        }
    }

    let body = match body {
        Some(bytes) if parts.method != Method::GET && parts.method != Method::HEAD => {
            Body::from(bytes.clone())
        }
        _ => Body::empty(),
    };

    builder.body(body)
}

fn record_failover(
    state: &AppState,
    origin: &Origin,
    snapshot: &std::collections::BTreeMap<String, crate::health::HealthStatus>,
    request_id: &str,
) {
    tracing::warn!(
        request_id = %request_id,
        origin = %origin.id,
        tier = origin.tier,
        "Request served by fallback tier"
    );
    metrics::record_failover(&origin.id, origin.tier);

    let health = state.health.clone();
    let event = crate::health::FailoverEvent::new(origin.id.clone(), origin.tier, snapshot.clone());
    // Never block the response on diagnostics
    tokio::spawn(async move {
        health.record_failover(&event);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn origin() -> Origin {
        Origin {
            id: "mirror".to_string(),
            label: "mirror".to_string(),
            base_url: Url::parse("http://127.0.0.1:3002").unwrap(),
            health_path: "/health".to_string(),
            tier: 2,
        }
    }

    fn parts(method: Method) -> Parts {
        let (parts, _) = Request::builder()
            .method(method)
            .uri("http://proxy.local/api/v1?x=1")
            .header("host", "proxy.local")
            .header("accept", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_rebuild_targets_origin() {
        let req = build_upstream_request(
            &origin(),
            &parts(Method::GET),
            None,
            Some("10.1.2.3".parse().unwrap()),
            "req-1",
        )
        .unwrap();

        assert_eq!(req.uri(), "http://127.0.0.1:3002/api/v1?x=1");
        // Host comes from the target URL, not the client
        assert!(req.headers().get("host").is_none());
        assert_eq!(req.headers()["accept"], "application/json");
        assert_eq!(req.headers()["x-forwarded-for"], "10.1.2.3");
        assert_eq!(req.headers()[X_REQUEST_ID], "req-1");
    }

    #[test]
    fn test_get_never_forwards_body() {
        use hyper::body::Body as _;

        let bytes = Bytes::from_static(b"payload");
        let req =
            build_upstream_request(&origin(), &parts(Method::GET), Some(&bytes), None, "req-1")
                .unwrap();
        // Body must be empty for GET even when one was supplied
        assert_eq!(req.body().size_hint().exact(), Some(0));

        let post = build_upstream_request(
            &origin(),
            &parts(Method::POST),
            Some(&bytes),
            None,
            "req-1",
        )
        .unwrap();
        assert_eq!(post.body().size_hint().exact(), Some(7));
    }

    #[test]
    fn test_forwarded_for_appends() {
        let (parts, _) = Request::builder()
            .method(Method::POST)
            .uri("http://proxy.local/")
            .header("x-forwarded-for", "192.0.2.7")
            .body(())
            .unwrap()
            .into_parts();

        let req = build_upstream_request(
            &origin(),
            &parts,
            Some(&Bytes::from_static(b"{}")),
            Some("10.1.2.3".parse().unwrap()),
            "req-1",
        )
        .unwrap();

        assert_eq!(req.headers()["x-forwarded-for"], "192.0.2.7, 10.1.2.3");
    }
}
