// ==========================================
// 订单管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{ConfigApi, DashboardApi, ExportApi, GroupApi, ImportApi, OrderApi};
use crate::config::ConfigManager;
use crate::db::open_shared_connection;
use crate::importer::OrderImporterImpl;
use crate::repository::{
    FullOrderRepository, GroupRepository, OrderImportRepositoryImpl, OrderRepository,
};

/// 应用状态
///
/// 包含所有API实例，作为 HTTP 路由的共享状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 订单API
    pub order_api: Arc<OrderApi>,

    /// 发货分组API
    pub group_api: Arc<GroupApi>,

    /// 订单导入API
    pub import_api: Arc<ImportApi>,

    /// 导出API
    pub export_api: Arc<ExportApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 配置管理器（启动时读取语言）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 所有仓储共享同一个连接；建表为幂等操作
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let full_order_repo = Arc::new(FullOrderRepository::from_connection(conn.clone()));
        let group_repo = Arc::new(GroupRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        // ==========================================
        // 初始化导入器
        // ==========================================
        let importer = Arc::new(OrderImporterImpl::with_default_components(
            OrderImportRepositoryImpl::from_connection(conn.clone()),
            ConfigManager::from_connection(conn),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let order_api = Arc::new(OrderApi::new(order_repo.clone(), full_order_repo));
        let group_api = Arc::new(GroupApi::new(group_repo.clone(), order_repo.clone()));
        let import_api = Arc::new(ImportApi::new(importer));
        let export_api = Arc::new(ExportApi::new(order_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(group_repo, order_repo));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            order_api,
            group_api,
            import_api,
            export_api,
            dashboard_api,
            config_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 ORDER_MANAGER_DB_PATH（非空时）
/// - 用户数据目录/order-manager/orders.db
/// - 无法获取数据目录时: ./orders.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("ORDER_MANAGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./orders.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("order-manager");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("orders.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
