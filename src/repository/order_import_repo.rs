// ==========================================
// 订单管理系统 - 订单导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::{ImportBatch, LineItemOutcome, PreparedLineItem};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// OrderImportRepository Trait
// ==========================================
// 用途: 订单导入相关数据访问
// 实现者: OrderImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait OrderImportRepository: Send + Sync {
    // ===== 批量写入（事务化）=====

    /// 写入一批订单行（完整记录 + 简化订单）
    ///
    /// # 参数
    /// - items: 待写入的订单行（按文件顺序）
    ///
    /// # 返回
    /// - Ok(Vec<LineItemOutcome>): 与 items 一一对应的写入结果
    /// - Err: 连接/事务级错误（单行错误不会进入这里）
    ///
    /// # 说明
    /// - 每个订单行在独立保存点内写入两张表，要么都成功要么都不写
    /// - 任一表唯一约束冲突 => Duplicate
    /// - 整批在最后统一提交
    async fn insert_line_items(
        &self,
        items: Vec<PreparedLineItem>,
    ) -> RepositoryResult<Vec<LineItemOutcome>>;

    // ===== 导入批次日志 =====

    /// 写入导入批次记录
    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次
    ///
    /// # 参数
    /// - limit: 最大返回条数
    async fn list_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
