use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};

/// Requests slower than this are logged at warn level.
pub const SLOW_REQUEST: Duration = Duration::from_millis(100);

pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    response
}

/// Log method, path, status and wall time of each request.
pub async fn request_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    if elapsed >= SLOW_REQUEST {
        tracing::warn!(
            %method,
            path,
            status,
            duration_ms = elapsed.as_millis() as u64,
            "slow request"
        );
    } else {
        tracing::debug!(
            %method,
            path,
            status,
            duration_ms = elapsed.as_millis() as u64,
            "request completed"
        );
    }
    response
}
