//! Transform Handler
//!
//! 接收 multipart 上传并执行变声

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::TransformVoice;
use crate::infrastructure::http::dto::TransformResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 解析表单布尔值，大小写不敏感
fn parse_flag(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "Invalid boolean for {}: {}",
            field, other
        ))),
    }
}

/// 上传音频并变声
///
/// 字段：`file`（必填）、`voice_id`（必填）、`retain_prosody`、`retain_accent`（默认 true）
pub async fn transform_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TransformResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut voice_id: Option<String> = None;
    let mut retain_prosody = true;
    let mut retain_accent = true;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| ApiError::BadRequest("Uploaded file has no filename".to_string()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            "voice_id" => {
                voice_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read voice_id: {}", e)))?,
                );
            }
            "retain_prosody" | "retain_accent" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e))
                })?;
                let flag = parse_flag(&field_name, &text)?;
                if field_name == "retain_prosody" {
                    retain_prosody = flag;
                } else {
                    retain_accent = flag;
                }
            }
            _ => {}
        }
    }

    let (original_filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("Audio file is required".to_string()))?;
    let voice_id = voice_id
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest("voice_id is required".to_string()))?;

    let command = TransformVoice {
        original_filename,
        data,
        voice_id,
        retain_prosody,
        retain_accent,
    };

    let result = state.transform_handler.handle(command).await?;

    tracing::info!(
        job_id = %result.job_id,
        status = %result.status,
        filename = %result.filename,
        "Transform request completed"
    );

    Ok(Json(TransformResponse {
        filename: result.filename,
        url: result.url,
        storage_url: result.storage_url,
    }))
}
