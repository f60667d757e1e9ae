// ==========================================
// 订单管理系统 - 发货分组 API
// ==========================================
// 职责: 分组创建/删除、成员管理、发货状态与物流单号
// 红线:
// - 一个分组至多 MAX_GROUP_SIZE 个订单
// - EXPRESS 订单不能加入分组
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::dto::{ActionResponse, BatchMoveResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::order_api::require_selection;
use crate::domain::group::{GroupWithCount, ShipmentGroup, MAX_GROUP_SIZE};
use crate::domain::order::SimplifiedOrder;
use crate::i18n::{t, t_with_args};
use crate::repository::{GroupRepository, OrderRepository};

// ==========================================
// GroupApi - 发货分组 API
// ==========================================
pub struct GroupApi {
    group_repo: Arc<GroupRepository>,
    order_repo: Arc<OrderRepository>,
}

impl GroupApi {
    /// 创建新的GroupApi实例
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

    fn require_group(&self, group_id: i64) -> ApiResult<ShipmentGroup> {
        self.group_repo
            .find_by_id(group_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分组(id={})不存在", group_id)))
    }

    // ==========================================
    // 分组维护
    // ==========================================

    /// 创建空分组
    pub fn create_group(&self, name: &str) -> ApiResult<ShipmentGroup> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("分组名称不能为空".to_string()));
        }
        let group_id = self.group_repo.create(name)?;
        info!(group_id, name = %name, "分组已创建");
        self.require_group(group_id)
    }

    /// 全部分组及成员数量
    pub fn list_groups(&self) -> ApiResult<Vec<GroupWithCount>> {
        Ok(self.group_repo.list_with_counts()?)
    }

    /// 仍有剩余容量的分组（批量移入的候选目标）
    pub fn list_groups_with_room(&self) -> ApiResult<Vec<GroupWithCount>> {
        Ok(self
            .group_repo
            .list_with_counts()?
            .into_iter()
            .filter(|g| !g.is_full())
            .collect())
    }

    /// 分组成员
    pub fn list_group_orders(&self, group_id: i64) -> ApiResult<Vec<SimplifiedOrder>> {
        self.require_group(group_id)?;
        Ok(self.order_repo.list_by_group(group_id)?)
    }

    /// 删除分组（成员订单保留，解除关联）
    pub fn delete_group(&self, group_id: i64) -> ApiResult<ActionResponse> {
        let affected = self.group_repo.delete(group_id)?;
        if affected == 0 {
            return Err(ApiError::NotFound(format!("分组(id={})不存在", group_id)));
        }
        info!(group_id, "分组已删除");
        Ok(ActionResponse::new(t("group.deleted"), affected))
    }

    // ==========================================
    // 成员管理
    // ==========================================

    /// 将单个订单加入分组
    ///
    /// # 返回
    /// - Err(NotFound): 分组或订单不存在
    /// - Err(FreightNotGroupable): EXPRESS 订单
    /// - Err(GroupFull): 分组已有 MAX_GROUP_SIZE 个订单
    pub fn add_order(&self, group_id: i64, order_id: &str) -> ApiResult<ActionResponse> {
        self.require_group(group_id)?;
        let order = self
            .order_repo
            .find_by_id(order_id.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))?
            .order;

        if !order.freight_type.is_groupable() {
            return Err(ApiError::FreightNotGroupable {
                order_id: order.order_id,
            });
        }

        let message = t_with_args("group.order_added", &[("order_id", &order.order_id)]);
        if order.group_id == Some(group_id) {
            debug!(group_id, order_id = %order.order_id, "订单已在分组中");
            return Ok(ActionResponse::new(message, 0));
        }

        let outcome = self
            .group_repo
            .assign_orders(group_id, &[order.order_id.clone()], MAX_GROUP_SIZE)?;
        info!(group_id, order_id = %order.order_id, "订单已加入分组");
        Ok(ActionResponse::new(message, outcome.moved.len()))
    }

    /// 将订单移出其分组
    pub fn remove_order(&self, order_id: &str) -> ApiResult<ActionResponse> {
        let order_id = order_id.trim();
        let affected = self.order_repo.set_group(order_id, None)?;
        if affected == 0 {
            return Err(ApiError::NotFound(format!("订单(id={})不存在", order_id)));
        }
        Ok(ActionResponse::new(
            t_with_args("group.order_removed", &[("order_id", order_id)]),
            affected,
        ))
    }

    /// 批量移入分组
    ///
    /// 当前成员数 + 选中数量 > MAX_GROUP_SIZE 时整体拒绝；只移动 STANDARD 订单
    pub fn move_orders(&self, group_id: i64, order_ids: &[String]) -> ApiResult<BatchMoveResponse> {
        let ids = require_selection(order_ids)?;
        let outcome = self
            .group_repo
            .assign_orders(group_id, &ids, MAX_GROUP_SIZE)?;

        info!(
            group_id,
            moved = outcome.moved.len(),
            skipped_express = outcome.skipped_express.len(),
            missing = outcome.missing.len(),
            "批量移入分组"
        );
        Ok(BatchMoveResponse {
            message: t_with_args("batch.moved", &[("count", &outcome.moved.len().to_string())]),
            moved: outcome.moved,
            skipped_express: outcome.skipped_express,
            missing: outcome.missing,
        })
    }

    // ==========================================
    // 发货状态
    // ==========================================

    /// 标记已发货并记录物流单号
    pub fn mark_shipped(&self, group_id: i64, tracking_code: &str) -> ApiResult<ActionResponse> {
        self.require_group(group_id)?;
        let affected = self
            .group_repo
            .mark_shipped(group_id, tracking_code.trim())?;
        info!(group_id, tracking_code = %tracking_code.trim(), "分组已发货");
        Ok(ActionResponse::new(t("group.shipped"), affected))
    }

    /// 标记待发货（清除物流单号）
    pub fn mark_pending(&self, group_id: i64) -> ApiResult<ActionResponse> {
        self.require_group(group_id)?;
        let affected = self.group_repo.mark_pending(group_id)?;
        Ok(ActionResponse::new(t("group.unshipped"), affected))
    }

    /// 修改物流单号（空字符串表示清空）
    pub fn update_tracking_code(
        &self,
        group_id: i64,
        tracking_code: Option<&str>,
    ) -> ApiResult<ActionResponse> {
        self.require_group(group_id)?;
        let code = tracking_code.map(str::trim).filter(|c| !c.is_empty());
        let affected = self.group_repo.update_tracking_code(group_id, code)?;
        Ok(ActionResponse::new(t("group.tracking_updated"), affected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::{FreightType, Size};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (GroupApi, Arc<OrderRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let orders = Arc::new(OrderRepository::from_connection(conn.clone()));
        let api = GroupApi::new(
            Arc::new(GroupRepository::from_connection(conn)),
            orders.clone(),
        );
        (api, orders)
    }

    fn seed(orders: &OrderRepository, id: &str, freight_type: FreightType) {
        orders
            .insert(&SimplifiedOrder::new(
                id.to_string(),
                "Cliente".to_string(),
                "Camiseta".to_string(),
                Size::M,
                freight_type,
            ))
            .unwrap();
    }

    #[test]
    fn test_create_group_requires_name() {
        let (api, _) = setup();
        assert!(matches!(
            api.create_group("   ").unwrap_err(),
            ApiError::InvalidInput(_)
        ));
        let group = api.create_group(" Grupo 1 ").unwrap();
        assert_eq!(group.name, "Grupo 1");
        assert!(!group.shipped);
    }

    #[test]
    fn test_sixth_order_rejected() {
        let (api, orders) = setup();
        let group = api.create_group("Grupo 1").unwrap();
        for i in 1..=6 {
            seed(&orders, &format!("P{}", i), FreightType::Standard);
        }
        for i in 1..=5 {
            api.add_order(group.group_id, &format!("P{}", i)).unwrap();
        }

        let err = api.add_order(group.group_id, "P6").unwrap_err();
        assert!(matches!(err, ApiError::GroupFull { capacity: 5, .. }));
        assert_eq!(api.list_group_orders(group.group_id).unwrap().len(), 5);
        assert!(api.list_groups_with_room().unwrap().is_empty());
    }

    #[test]
    fn test_express_order_rejected() {
        let (api, orders) = setup();
        let group = api.create_group("Grupo 1").unwrap();
        seed(&orders, "E1", FreightType::Express);

        let err = api.add_order(group.group_id, "E1").unwrap_err();
        assert!(matches!(err, ApiError::FreightNotGroupable { .. }));
        assert!(api.list_group_orders(group.group_id).unwrap().is_empty());
    }

    #[test]
    fn test_move_orders_whole_batch_capacity() {
        let (api, orders) = setup();
        let group = api.create_group("Grupo 1").unwrap();
        for i in 1..=6 {
            seed(&orders, &format!("P{}", i), FreightType::Standard);
        }
        seed(&orders, "E1", FreightType::Express);

        let ids: Vec<String> = (1..=6).map(|i| format!("P{}", i)).collect();
        assert!(matches!(
            api.move_orders(group.group_id, &ids).unwrap_err(),
            ApiError::GroupFull { .. }
        ));
        assert!(api.list_group_orders(group.group_id).unwrap().is_empty());

        let resp = api
            .move_orders(
                group.group_id,
                &["P1".to_string(), "E1".to_string(), "X".to_string()],
            )
            .unwrap();
        assert_eq!(resp.moved, vec!["P1".to_string()]);
        assert_eq!(resp.skipped_express, vec!["E1".to_string()]);
        assert_eq!(resp.missing, vec!["X".to_string()]);
    }

    #[test]
    fn test_ship_and_unship() {
        let (api, _) = setup();
        let group = api.create_group("Grupo 1").unwrap();

        api.mark_shipped(group.group_id, " BR123 ").unwrap();
        let shipped = api.require_group(group.group_id).unwrap();
        assert!(shipped.shipped);
        assert_eq!(shipped.tracking_code.as_deref(), Some("BR123"));

        api.update_tracking_code(group.group_id, Some("BR999")).unwrap();
        assert_eq!(
            api.require_group(group.group_id).unwrap().tracking_code.as_deref(),
            Some("BR999")
        );

        api.mark_pending(group.group_id).unwrap();
        let pending = api.require_group(group.group_id).unwrap();
        assert!(!pending.shipped);
        assert!(pending.tracking_code.is_none());

        assert!(matches!(
            api.mark_shipped(999, "X").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_group_keeps_orders() {
        let (api, orders) = setup();
        let group = api.create_group("Grupo 1").unwrap();
        seed(&orders, "P1", FreightType::Standard);
        api.add_order(group.group_id, "P1").unwrap();

        api.delete_group(group.group_id).unwrap();
        let order = orders.find_by_id("P1").unwrap().unwrap();
        assert!(order.order.group_id.is_none());
    }
}
