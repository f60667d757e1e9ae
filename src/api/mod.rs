// ==========================================
// 订单管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 路由调用
// ==========================================

pub mod config_api;
pub mod dashboard_api;
pub mod dto;
pub mod error;
pub mod export_api;
pub mod group_api;
pub mod import_api;
pub mod order_api;

// 重导出核心类型
pub use config_api::{ConfigApi, ConfigItem};
pub use dashboard_api::{DashboardApi, DashboardTotals, DashboardView};
pub use dto::{ActionResponse, AvailableOrders, BatchMoveResponse};
pub use error::{ApiError, ApiResult};
pub use export_api::{build_export_rows, ExportApi, ExportFile, ExportRow, EXPORT_HEADERS};
pub use group_api::GroupApi;
pub use import_api::{DefaultOrderImporter, ImportApi, ImportApiResponse};
pub use order_api::OrderApi;
