// ==========================================
// 订单管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// ==========================================

pub mod error;
pub mod full_order_repo;
pub mod group_repo;
pub mod order_import_repo;
pub mod order_import_repo_impl;
pub mod order_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use full_order_repo::FullOrderRepository;
pub use group_repo::{AssignOutcome, GroupRepository};
pub use order_import_repo::OrderImportRepository;
pub use order_import_repo_impl::OrderImportRepositoryImpl;
pub use order_repo::OrderRepository;
