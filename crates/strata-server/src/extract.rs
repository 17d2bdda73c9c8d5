//! Request context extraction.
//!
//! Builds the [`RequestContext`] every guard call receives: the subject
//! forwarded by the authenticating proxy, caller metadata for the audit
//! trail, and the matched route's path parameters.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts, Path};
use axum::http::{HeaderMap, request::Parts};
use strata_auth::{AuditSource, RequestContext, UserId};

use crate::server::AppState;

/// Extract caller address and agent from request headers.
///
/// `X-Forwarded-For` (first hop) wins over `X-Real-IP`; the socket peer is
/// the last resort. A header whose value is not an IP address is skipped.
pub fn extract_audit_source(headers: &HeaderMap, peer: Option<SocketAddr>) -> AuditSource {
    let ip_address = header_ip(headers, "x-forwarded-for")
        .or_else(|| header_ip(headers, "x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip()));

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    AuditSource {
        ip_address,
        user_agent,
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
}

/// Reads the subject id from the trusted header. Blank values count as absent.
pub fn extract_subject(headers: &HeaderMap, header_name: &str) -> Option<UserId> {
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(UserId::new)
}

/// Axum extractor producing the guard's request context.
#[derive(Debug, Clone)]
pub struct GuardContext(pub RequestContext);

impl FromRequestParts<AppState> for GuardContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        // Routes without parameters reject `Path`; treat that as empty.
        let params = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();

        Ok(Self(RequestContext {
            subject: extract_subject(&parts.headers, &state.session().subject_header),
            source: extract_audit_source(&parts.headers, peer),
            params,
        }))
    }
}
