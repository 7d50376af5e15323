//! HTTP Middleware
//!
//! 4xx / 5xx 响应日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 错误状态码日志中间件
///
/// 业务错误详情已在 ApiError::into_response() 中记录，这里补充方法、路径与耗时。
/// 超出上传大小限制（413）单独记录，便于调整 `max_upload_size`。
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(
            method = %method,
            uri = %uri,
            elapsed_ms,
            "Upload rejected: body exceeds configured limit"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    }

    response
}
