//! Root and Ping Handlers
//!
//! 欢迎信息与健康检查

use axum::Json;
use serde::Serialize;

use crate::infrastructure::http::dto::MessageResponse;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// 根路径
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to VoiceForge API",
    })
}

/// Ping endpoint - 健康检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
