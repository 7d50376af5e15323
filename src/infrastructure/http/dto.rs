//! Data Transfer Objects
//!
//! 响应体直接对应各端点的 JSON 形状

use serde::Serialize;

use crate::domain::job::TransformationJob;
use crate::domain::voice::VoiceDescriptor;

/// `GET /`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `GET /api/voices`
#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: &'static [VoiceDescriptor],
}

/// `GET /api/history`
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<TransformationJob>,
}

/// `POST /api/transform`
#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub filename: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
}
