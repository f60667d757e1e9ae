use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::app::state::AppState;

/// GET /api/export
pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let file = state.export_api.export_csv()?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    )
        .into_response())
}
