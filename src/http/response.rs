//! Response transformation.
//!
//! # Responsibilities
//! - Tag responses with the tier and origin that served them
//! - Build the fixed maintenance response for total exhaustion
//!
//! # Design Decisions
//! - Tag headers are always both present or both absent
//! - The maintenance page is deliberately generic: no internal error
//!   detail ever reaches the client
//! - Exhaustion is never cached; each request re-walks all origins

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::origin::Origin;

/// Header carrying `<tier>:<label>` of the serving origin.
pub const TIER_HEADER: &str = "x-failover-tier";

/// Header carrying the id of the serving origin.
pub const ORIGIN_HEADER: &str = "x-failover-origin";

/// Clients are told to come back after this many seconds.
const RETRY_AFTER_SECS: u32 = 60;

const MAINTENANCE_BODY: &str = r#"<!DOCTYPE html>
<html>
<head><title>Maintenance</title>
<style>
  body{font-family:system-ui;display:flex;align-items:center;justify-content:center;height:100vh;margin:0;flex-direction:column}
  h1{font-size:3rem;margin:0}
  p{color:#888;margin-top:1rem}
</style>
</head>
<body>
  <h1>Temporarily offline</h1>
  <p>All systems are temporarily offline. We'll be back shortly.</p>
</body>
</html>"#;

/// Mark which tier and origin actually served this response.
pub fn tag_response<B>(response: &mut Response<B>, origin: &Origin) {
    let tier = format!("{}:{}", origin.tier, origin.label);
    if let Ok(value) = HeaderValue::from_str(&tier) {
        response.headers_mut().insert(TIER_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&origin.id) {
        response.headers_mut().insert(ORIGIN_HEADER, value);
    }
}

/// The fixed response returned when every origin attempt failed.
pub fn maintenance_page() -> Response<Body> {
    let mut response = Response::new(Body::from(MAINTENANCE_BODY));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html;charset=UTF-8"),
    );
    response.headers_mut().insert(
        header::RETRY_AFTER,
        HeaderValue::from(RETRY_AFTER_SECS),
    );
    response
}
