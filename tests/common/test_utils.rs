use super::mocks::MockModelClient;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Rgb, RgbImage};
use logic_lens::{
    analysis::Analyzer,
    config::RateLimitConfig,
    limiter::RateLimiter,
    server::{AppState, router},
};
use serde_json::Value;
use std::{io::Cursor, net::SocketAddr, sync::Arc, time::Duration};

pub const BODY_LIMIT: usize = 50 * 1024 * 1024;

pub const BINARY_ADDITION: &str = r#"{"type":"binary_arithmetic","operation":"addition","operand1":"1010","operand2":"0101","result":"1111"}"#;

/// Rate limits with the service defaults (3 per client, 15 global, 60s windows).
pub fn default_limits() -> RateLimitConfig {
    RateLimitConfig::default()
}

pub fn limits(per_client_max: u32, global_max: u32) -> RateLimitConfig {
    RateLimitConfig {
        per_client_max,
        global_max,
        ..RateLimitConfig::default()
    }
}

/// Router wired to the given mock, plus the limiter so tests can inspect counters.
pub fn create_test_app(
    mock: MockModelClient,
    limits: RateLimitConfig,
) -> (Router, Arc<RateLimiter>) {
    create_test_app_with_timeout(mock, limits, None)
}

pub fn create_test_app_with_timeout(
    mock: MockModelClient,
    limits: RateLimitConfig,
    timeout: Option<Duration>,
) -> (Router, Arc<RateLimiter>) {
    let limiter = Arc::new(RateLimiter::new(&limits));
    let analyzer = Analyzer::new(limiter.clone(), Arc::new(mock), timeout);
    let state = AppState {
        analyzer: Arc::new(analyzer),
        trusted_proxies: limits.trusted_proxies.clone().into(),
    };
    (router(state, BODY_LIMIT), limiter)
}

/// Small solid-colour image encoded in `format`, as raw bytes.
pub fn image_bytes(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([12, 200, 64]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode fixture image");
    buf
}

pub fn data_url(format: ImageFormat, mime: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        BASE64.encode(image_bytes(format, 8, 6))
    )
}

pub fn png_data_url() -> String {
    data_url(ImageFormat::Png, "image/png")
}

/// `POST /api/analyze` from the given client IP.
pub fn analyze_request(body: &Value, client_ip: [u8; 4]) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((client_ip, 40000))));
    request
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
