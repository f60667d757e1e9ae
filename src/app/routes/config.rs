use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::{ConfigItem, DashboardTotals, DashboardView};
use crate::app::state::AppState;

// ==========================================
// 配置与驾驶舱
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfigRequest {
    pub value: String,
}

/// GET /api/config
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ConfigItem>>, ApiError> {
    Ok(Json(state.config_api.list_configs()?))
}

/// PUT /api/config/:key
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<UpdateConfigRequest>,
) -> Result<Json<ConfigItem>, ApiError> {
    Ok(Json(state.config_api.update_config(&key, &req.value)?))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(state.dashboard_api.get_dashboard()?))
}

/// GET /api/dashboard/totals
pub async fn totals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardTotals>, ApiError> {
    Ok(Json(state.dashboard_api.get_totals()?))
}
