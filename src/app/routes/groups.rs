use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::ActionResponse;
use crate::app::state::AppState;
use crate::domain::group::{GroupWithCount, ShipmentGroup};
use crate::domain::order::SimplifiedOrder;

// ==========================================
// 发货分组
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOrderRequest {
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipRequest {
    pub tracking_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRequest {
    pub tracking_code: Option<String>,
}

/// GET /api/groups
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupWithCount>>, ApiError> {
    Ok(Json(state.group_api.list_groups()?))
}

/// GET /api/groups/with-room
pub async fn list_with_room(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupWithCount>>, ApiError> {
    Ok(Json(state.group_api.list_groups_with_room()?))
}

/// POST /api/groups
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<Json<ShipmentGroup>, ApiError> {
    Ok(Json(state.group_api.create_group(&req.name)?))
}

/// DELETE /api/groups/:group_id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.group_api.delete_group(group_id)?))
}

/// GET /api/groups/:group_id/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<Json<Vec<SimplifiedOrder>>, ApiError> {
    Ok(Json(state.group_api.list_group_orders(group_id)?))
}

/// POST /api/groups/:group_id/orders
pub async fn add_order(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Json(req): Json<AddOrderRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.group_api.add_order(group_id, &req.order_id)?))
}

/// DELETE /api/groups/:group_id/orders/:order_id
pub async fn remove_order(
    State(state): State<Arc<AppState>>,
    Path((_group_id, order_id)): Path<(i64, String)>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.group_api.remove_order(&order_id)?))
}

/// POST /api/groups/:group_id/ship
pub async fn ship(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Json(req): Json<ShipRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.group_api.mark_shipped(group_id, &req.tracking_code)?))
}

/// POST /api/groups/:group_id/unship
pub async fn unship(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.group_api.mark_pending(group_id)?))
}

/// PUT /api/groups/:group_id/tracking
pub async fn update_tracking(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Json(req): Json<TrackingRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(
        state
            .group_api
            .update_tracking_code(group_id, req.tracking_code.as_deref())?,
    ))
}
