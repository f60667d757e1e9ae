// ==========================================
// 订单管理系统 - 应用层
// ==========================================
// 职责: HTTP 集成,连接前端与后端
// ==========================================

pub mod routes;
pub mod state;

// 重导出
pub use routes::{build_router, map_api_error, ErrorResponse};
pub use state::{get_default_db_path, AppState};
