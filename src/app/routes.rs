// ==========================================
// 订单管理系统 - HTTP 路由
// ==========================================
// 职责: 将 API 层暴露为 JSON/HTTP 接口
// 错误: ApiError → 状态码 + {code, message, details}
// ==========================================

pub mod common;
pub mod config;
pub mod export;
pub mod groups;
pub mod import;
pub mod orders;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::app::state::AppState;

pub use common::{map_api_error, ErrorResponse};

/// 上传文件大小上限
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// 构建应用路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // 导入 / 导出
        // ========================================
        .route(
            "/api/import",
            post(import::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/import/batches", get(import::list_batches))
        .route("/api/export", get(export::export_csv))
        // ========================================
        // 订单
        // ========================================
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/available", get(orders::available))
        .route("/api/orders/groupable", get(orders::groupable))
        .route("/api/orders/express", get(orders::express))
        .route("/api/orders/batch/delete", post(orders::batch_delete))
        .route(
            "/api/orders/batch/remove-from-groups",
            post(orders::batch_remove_from_groups),
        )
        .route("/api/orders/batch/move", post(orders::batch_move))
        .route(
            "/api/orders/:order_id",
            get(orders::get_by_id)
                .put(orders::update)
                .delete(orders::delete),
        )
        // 导入记录
        .route("/api/imported", get(orders::list_imported))
        .route(
            "/api/imported/:line_item_id",
            get(orders::get_imported).delete(orders::delete_imported),
        )
        // ========================================
        // 发货分组
        // ========================================
        .route("/api/groups", get(groups::list).post(groups::create))
        .route("/api/groups/with-room", get(groups::list_with_room))
        .route("/api/groups/:group_id", delete(groups::delete))
        .route(
            "/api/groups/:group_id/orders",
            get(groups::list_orders).post(groups::add_order),
        )
        .route(
            "/api/groups/:group_id/orders/:order_id",
            delete(groups::remove_order),
        )
        .route("/api/groups/:group_id/ship", post(groups::ship))
        .route("/api/groups/:group_id/unship", post(groups::unship))
        .route("/api/groups/:group_id/tracking", put(groups::update_tracking))
        // ========================================
        // 驾驶舱 / 配置 / 维护
        // ========================================
        .route("/api/dashboard", get(config::dashboard))
        .route("/api/dashboard/totals", get(config::totals))
        .route("/api/config", get(config::list))
        .route("/api/config/:key", put(config::update))
        .route("/api/admin/data", delete(orders::clear_all))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
