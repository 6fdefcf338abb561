use super::types::MessageResponse;
use crate::analysis::{AnalyzeRequest, Analyzer};
use axum::{
    body::Bytes,
    extract::{ConnectInfo, State, rejection::BytesRejection},
    http::{
        HeaderMap, HeaderValue,
        header::{CONTENT_TYPE, RETRY_AFTER},
    },
    response::{IntoResponse, Json, Response},
};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub trusted_proxies: Arc<[IpAddr]>,
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "hello".to_string(),
    })
}

pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Server pinged at Ping".to_string(),
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Bytes, BytesRejection>,
) -> Response {
    let client = client_key(peer, &headers, &state.trusted_proxies);
    info!("Received analyze request from {}", client);

    let body = payload
        .map_err(|rejection| rejection.body_text())
        .and_then(|bytes| decode_body(&headers, &bytes));

    let outcome = state.analyzer.analyze(&client, body).await;
    info!(
        "Request {} answered with {} ({:?})",
        outcome.request_id,
        outcome.status_code(),
        outcome.state
    );

    let status = outcome.status_code();
    let mut response = (status, Json(outcome.response)).into_response();
    if let Some(window) = outcome.retry_after {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(window.as_secs()));
    }
    response
}

/// Request body as an [`AnalyzeRequest`].
///
/// Empty bodies and bodies sent without a JSON content type carry no fields,
/// so they decode to the empty request and fail the image check downstream.
pub fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<AnalyzeRequest, String> {
    if body.iter().all(u8::is_ascii_whitespace) || !is_json_content_type(headers) {
        return Ok(AnalyzeRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| format!("Failed to parse the request body as JSON: {}", e))
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|h| h.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.to_ascii_lowercase().ends_with("+json")
}

/// Client address used as the per-client rate-limit key.
///
/// `X-Forwarded-For` is only read when the peer is a trusted proxy. The chain
/// is walked right to left and the first hop that is not itself a trusted
/// proxy wins, since entries further left are supplied by the caller.
pub fn client_key(peer: SocketAddr, headers: &HeaderMap, trusted_proxies: &[IpAddr]) -> String {
    let peer_ip = peer.ip();
    if !trusted_proxies.contains(&peer_ip) {
        return peer_ip.to_string();
    }

    let forwarded = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|header| header.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();

    for hop in forwarded.into_iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(ip) if trusted_proxies.contains(&ip) => continue,
            Ok(ip) => return ip.to_string(),
            Err(_) => break,
        }
    }
    peer_ip.to_string()
}
