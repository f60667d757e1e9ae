// ==========================================
// 订单管理系统 - API 数据传输对象
// ==========================================
// 职责: 多个 API 共用的响应结构
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::order::SimplifiedOrder;

/// 写操作的通用响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// 本地化提示消息
    pub message: String,
    /// 受影响的记录数
    pub affected: usize,
}

impl ActionResponse {
    pub fn new(message: String, affected: usize) -> Self {
        Self { message, affected }
    }
}

/// 未分组订单（按运费类型拆分）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableOrders {
    pub standard: Vec<SimplifiedOrder>,
    pub express: Vec<SimplifiedOrder>,
}

/// 批量移入分组的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMoveResponse {
    pub message: String,
    pub moved: Vec<String>,
    /// EXPRESS 订单不会被移动
    pub skipped_express: Vec<String>,
    /// 不存在的订单号
    pub missing: Vec<String>,
}
