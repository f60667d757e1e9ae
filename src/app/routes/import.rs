use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::ImportApiResponse;
use crate::app::state::AppState;
use crate::domain::import::ImportBatch;

// ==========================================
// 订单导入
// ==========================================

/// 上传表单中的文件字段名
pub const UPLOAD_FIELD: &str = "file";

const DEFAULT_BATCH_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub limit: Option<usize>,
}

/// POST /api/import
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportApiResponse>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut bytes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        file_name = field.file_name().map(str::to_string);
        bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?
            .to_vec();
    }

    let response = state
        .import_api
        .import_upload(file_name.as_deref(), &bytes)
        .await?;
    Ok(Json(response))
}

/// GET /api/import/batches?limit=
pub async fn list_batches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Vec<ImportBatch>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_BATCH_LIMIT);
    Ok(Json(state.import_api.list_recent_batches(limit).await?))
}
