//! History Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ListHistory;
use crate::infrastructure::http::dto::HistoryResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出全部变声任务（按提交顺序）
pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = state.list_history_handler.handle(ListHistory).await?;
    Ok(Json(HistoryResponse { history }))
}
