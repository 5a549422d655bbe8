//! Header sanitation for forwarded requests and relayed responses.
//!
//! # Design Decisions
//! - `host` and `content-length` are recomputed by the client, never copied
//! - Hop-by-hop headers (RFC 9110 §7.6.1) are connection-scoped and dropped
//! - Everything else, `authorization` included, passes through

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::http::request::X_REQUEST_ID;

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name) || name.as_str() == "keep-alive"
}

/// Headers to send upstream for an inbound request.
pub fn upstream_request_headers(
    inbound: &HeaderMap,
    client_ip: Option<IpAddr>,
    request_id: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 2);
    for (name, value) in inbound {
        if name == header::HOST || name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(ip) = client_ip {
        let forwarded_for = match inbound
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{}, {}", prior, ip),
            None => ip.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert("x-forwarded-for", value);
        }
    }

    if let Some(id) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(X_REQUEST_ID, id);
    }
    headers
}

/// Headers to relay back to the client from an upstream response.
pub fn relayed_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if name == header::CONTENT_LENGTH || is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
