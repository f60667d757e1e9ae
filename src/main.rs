// ==========================================
// 订单管理系统 - HTTP 服务主入口
// ==========================================
// 技术栈: axum + Rust + SQLite
// ==========================================

use std::net::SocketAddr;
use std::sync::Arc;

use order_manager::app::{build_router, get_default_db_path, AppState};
use order_manager::{i18n, logging};

/// 默认监听地址
const DEFAULT_BIND: &str = "0.0.0.0:5000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", order_manager::APP_NAME);
    tracing::info!("系统版本: {}", order_manager::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    // 界面语言: 环境变量优先，其次为已保存配置
    let locale = match std::env::var("ORDER_MANAGER_LOCALE") {
        Ok(value) if i18n::is_supported(value.trim()) => value.trim().to_string(),
        Ok(value) => {
            tracing::warn!("不支持的语言 {}，使用已保存配置", value);
            app_state.config_manager.get_locale()?
        }
        Err(_) => app_state.config_manager.get_locale()?,
    };
    i18n::set_locale(&locale);
    tracing::info!("界面语言: {}", locale);

    // 监听地址
    let bind = std::env::var("ORDER_MANAGER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| anyhow::anyhow!("无效的监听地址 {}: {}", bind, e))?;

    let app = build_router(Arc::new(app_state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP 服务已启动: http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
