// ==========================================
// 订单管理系统 - 驾驶舱 API
// ==========================================
// 职责: 首页聚合查询（分组 + 成员、加急订单、统计）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::group::GroupWithOrders;
use crate::domain::order::SimplifiedOrder;
use crate::domain::types::FreightType;
use crate::repository::{GroupRepository, OrderRepository};

/// 统计数字
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub total_orders: usize,
    pub grouped_orders: usize,
    pub ungrouped_orders: usize,
    pub total_groups: usize,
    pub shipped_groups: usize,
}

/// 驾驶舱视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub groups: Vec<GroupWithOrders>,
    pub express_orders: Vec<SimplifiedOrder>,
    pub totals: DashboardTotals,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    group_repo: Arc<GroupRepository>,
    order_repo: Arc<OrderRepository>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    ///
    /// # 参数
    /// - group_repo: 分组仓储
    /// - order_repo: 简化订单仓储
    pub fn new(group_repo: Arc<GroupRepository>, order_repo: Arc<OrderRepository>) -> Self {
        Self {
            group_repo,
            order_repo,
        }
    }

    /// 统计数字
    pub fn get_totals(&self) -> ApiResult<DashboardTotals> {
        let (total_orders, grouped_orders) = self.order_repo.count_totals()?;
        let (total_groups, shipped_groups) = self.group_repo.count_totals()?;
        Ok(DashboardTotals {
            total_orders,
            grouped_orders,
            ungrouped_orders: total_orders.saturating_sub(grouped_orders),
            total_groups,
            shipped_groups,
        })
    }

    /// 驾驶舱视图
    pub fn get_dashboard(&self) -> ApiResult<DashboardView> {
        let groups = self
            .group_repo
            .list_with_counts()?
            .into_iter()
            .map(|g| {
                let orders = self.order_repo.list_by_group(g.group.group_id)?;
                Ok(GroupWithOrders {
                    group: g.group,
                    orders,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(DashboardView {
            groups,
            express_orders: self.order_repo.list_by_freight(FreightType::Express)?,
            totals: self.get_totals()?,
        })
    }
}
