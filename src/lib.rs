// ==========================================
// 订单管理系统 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 订单跟踪、发货分组（每组至多 5 单）与 CSV 批量导入
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - CSV 订单导入管道
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FreightType, Size};

// 领域实体
pub use domain::{
    FullOrderRecord, GroupWithCount, ImportBatch, ImportReport, ImportSummary, OrderHeader,
    ShipmentGroup, SimplifiedOrder, MAX_GROUP_SIZE,
};

// 导入器
pub use importer::{OrderImporter, OrderImporterImpl};

// API
pub use api::{ConfigApi, DashboardApi, ExportApi, GroupApi, ImportApi, OrderApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单管理系统";
