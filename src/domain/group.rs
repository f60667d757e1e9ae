// ==========================================
// 订单管理系统 - 发货分组领域模型
// ==========================================
// 红线: 一个分组至多 5 个订单，且只能包含 STANDARD 订单
// 对齐: shipment_group 表
// ==========================================

use crate::domain::order::SimplifiedOrder;
use serde::{Deserialize, Serialize};

/// 单个分组的订单容量上限
pub const MAX_GROUP_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentGroup {
    pub group_id: i64,
    pub name: String,
    pub tracking_code: Option<String>,
    pub shipped: bool,
    pub created_at: Option<String>,
}

/// 分组 + 成员数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupWithCount {
    #[serde(flatten)]
    pub group: ShipmentGroup,
    pub order_count: usize,
}

impl GroupWithCount {
    /// 剩余容量
    pub fn remaining_capacity(&self) -> usize {
        MAX_GROUP_SIZE.saturating_sub(self.order_count)
    }

    pub fn is_full(&self) -> bool {
        self.order_count >= MAX_GROUP_SIZE
    }
}

/// 分组 + 成员明细（驾驶舱使用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupWithOrders {
    #[serde(flatten)]
    pub group: ShipmentGroup,
    pub orders: Vec<SimplifiedOrder>,
}
