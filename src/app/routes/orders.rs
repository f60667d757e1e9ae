use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::{ActionResponse, AvailableOrders, BatchMoveResponse};
use crate::app::state::AppState;
use crate::domain::order::{
    FullOrderRecord, OrderDraft, OrderUpdate, OrderWithGroup, SimplifiedOrder,
};

// ==========================================
// 订单
// ==========================================

/// 批量操作请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub order_ids: Vec<String>,
}

/// 批量移入分组请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMoveRequest {
    pub group_id: i64,
    pub order_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportedQuery {
    pub limit: Option<usize>,
}

/// GET /api/orders
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrderWithGroup>>, ApiError> {
    Ok(Json(state.order_api.list_orders()?))
}

/// POST /api/orders
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.create_order(&draft)?))
}

/// GET /api/orders/available
pub async fn available(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AvailableOrders>, ApiError> {
    Ok(Json(state.order_api.list_available()?))
}

/// GET /api/orders/groupable
pub async fn groupable(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SimplifiedOrder>>, ApiError> {
    Ok(Json(state.order_api.list_groupable()?))
}

/// GET /api/orders/express
pub async fn express(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SimplifiedOrder>>, ApiError> {
    Ok(Json(state.order_api.list_express()?))
}

/// GET /api/orders/:order_id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderWithGroup>, ApiError> {
    Ok(Json(state.order_api.get_order(&order_id)?))
}

/// PUT /api/orders/:order_id
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Json(update): Json<OrderUpdate>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.update_order(&order_id, &update)?))
}

/// DELETE /api/orders/:order_id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.delete_order(&order_id)?))
}

// ===== 批量操作 =====

/// POST /api/orders/batch/delete
pub async fn batch_delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.batch_delete(&req.order_ids)?))
}

/// POST /api/orders/batch/remove-from-groups
pub async fn batch_remove_from_groups(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.batch_remove_from_groups(&req.order_ids)?))
}

/// POST /api/orders/batch/move
pub async fn batch_move(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchMoveRequest>,
) -> Result<Json<BatchMoveResponse>, ApiError> {
    Ok(Json(state.group_api.move_orders(req.group_id, &req.order_ids)?))
}

// ===== 导入记录 =====

/// GET /api/imported?limit=
pub async fn list_imported(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImportedQuery>,
) -> Result<Json<Vec<FullOrderRecord>>, ApiError> {
    Ok(Json(state.order_api.list_imported(query.limit)?))
}

/// GET /api/imported/:line_item_id
pub async fn get_imported(
    State(state): State<Arc<AppState>>,
    Path(line_item_id): Path<String>,
) -> Result<Json<FullOrderRecord>, ApiError> {
    Ok(Json(state.order_api.get_imported(&line_item_id)?))
}

/// DELETE /api/imported/:line_item_id
pub async fn delete_imported(
    State(state): State<Arc<AppState>>,
    Path(line_item_id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.delete_imported(&line_item_id)?))
}

// ===== 维护 =====

/// DELETE /api/admin/data
pub async fn clear_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActionResponse>, ApiError> {
    Ok(Json(state.order_api.clear_all_data()?))
}
