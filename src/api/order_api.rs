// ==========================================
// 订单管理系统 - 订单 API
// ==========================================
// 职责: 订单录入/查询/编辑/删除、批量操作、导入记录管理
// 红线: 已分组订单不能改为 EXPRESS
// ==========================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dto::{ActionResponse, AvailableOrders};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::{
    FullOrderRecord, OrderDraft, OrderHeader, OrderUpdate, OrderWithGroup, SimplifiedOrder,
};
use crate::domain::types::FreightType;
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use crate::repository::{FullOrderRepository, OrderRepository};

/// 校验必填文本字段
fn require_text(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

/// 校验批量选择不为空
pub(crate) fn require_selection(order_ids: &[String]) -> ApiResult<Vec<String>> {
    let ids: Vec<String> = order_ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(ApiError::InvalidInput(t("batch.no_selection")));
    }
    Ok(ids)
}

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    order_repo: Arc<OrderRepository>,
    full_order_repo: Arc<FullOrderRepository>,
}

impl OrderApi {
    /// 创建新的OrderApi实例
    ///
    /// # 参数
    /// - order_repo: 简化订单仓储
    /// - full_order_repo: 完整导入记录仓储
    pub fn new(order_repo: Arc<OrderRepository>, full_order_repo: Arc<FullOrderRepository>) -> Self {
        Self {
            order_repo,
            full_order_repo,
        }
    }

    // ==========================================
    // 单个订单
    // ==========================================

    /// 手工录入订单
    ///
    /// 同时写入简化订单与最小完整记录（两者同标识）
    ///
    /// # 返回
    /// - Err(BusinessRuleViolation): 订单号已存在
    pub fn create_order(&self, draft: &OrderDraft) -> ApiResult<ActionResponse> {
        let order_id = require_text("订单号", &draft.order_id)?;
        let customer_name = require_text("客户名称", &draft.customer_name)?;
        let product_name = require_text("商品名称", &draft.product_name)?;

        let order = SimplifiedOrder::new(
            order_id.clone(),
            customer_name.clone(),
            product_name.clone(),
            draft.size,
            draft.freight_type,
        );
        let full = FullOrderRecord {
            line_item_id: order_id.clone(),
            order_number: order_id.clone(),
            header: OrderHeader {
                buyer_name: customer_name,
                ..Default::default()
            },
            product_name,
            product_value: 0.0,
            imported_at: None,
        };

        match self.order_repo.insert_with_full_record(&order, &full) {
            Ok(()) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                warn!(order_id = %order_id, "订单号已存在");
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单号已存在: {}",
                    order_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(order_id = %order_id, freight = %draft.freight_type, "订单已录入");
        Ok(ActionResponse::new(
            t_with_args("order.created", &[("id", &order_id)]),
            1,
        ))
    }

    /// 按订单号查询（带分组名称）
    pub fn get_order(&self, order_id: &str) -> ApiResult<OrderWithGroup> {
        self.order_repo
            .find_by_id(order_id.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("订单(id={})不存在", order_id)))
    }

    /// 编辑订单
    ///
    /// # 返回
    /// - Err(FreightNotGroupable): 已分组订单改为 EXPRESS
    pub fn update_order(&self, order_id: &str, update: &OrderUpdate) -> ApiResult<ActionResponse> {
        let current = self.get_order(order_id)?;

        let cleaned = OrderUpdate {
            customer_name: require_text("客户名称", &update.customer_name)?,
            product_name: require_text("商品名称", &update.product_name)?,
            size: update.size,
            freight_type: update.freight_type,
        };
        let affected = self.order_repo.update(&current.order.order_id, &cleaned)?;
        if affected == 0 {
            // 未更新：订单已被删除，或已分组订单改为 EXPRESS
            return match self.order_repo.find_by_id(&current.order.order_id)? {
                Some(found) if found.order.group_id.is_some() => {
                    Err(ApiError::FreightNotGroupable {
                        order_id: found.order.order_id,
                    })
                }
                _ => Err(ApiError::NotFound(format!("订单(id={})不存在", order_id))),
            };
        }

        Ok(ActionResponse::new(
            t_with_args("order.updated", &[("id", &current.order.order_id)]),
            affected,
        ))
    }

    /// 删除订单（简化订单 + 同标识完整记录）
    pub fn delete_order(&self, order_id: &str) -> ApiResult<ActionResponse> {
        let order_id = order_id.trim();
        let affected = self.order_repo.delete(order_id)?;
        if affected == 0 {
            return Err(ApiError::NotFound(format!("订单(id={})不存在", order_id)));
        }
        info!(order_id = %order_id, "订单已删除");
        Ok(ActionResponse::new(
            t_with_args("order.deleted", &[("id", order_id)]),
            affected,
        ))
    }

    // ==========================================
    // 列表查询
    // ==========================================

    /// 全部订单（带分组信息，最新在前）
    pub fn list_orders(&self) -> ApiResult<Vec<OrderWithGroup>> {
        Ok(self.order_repo.list_all_with_group()?)
    }

    /// 未分组订单，按运费类型拆分
    pub fn list_available(&self) -> ApiResult<AvailableOrders> {
        let (standard, express): (Vec<_>, Vec<_>) = self
            .order_repo
            .list_ungrouped(None)?
            .into_iter()
            .partition(|o| o.freight_type.is_groupable());
        Ok(AvailableOrders { standard, express })
    }

    /// 可加入分组的订单（未分组的 STANDARD 订单）
    pub fn list_groupable(&self) -> ApiResult<Vec<SimplifiedOrder>> {
        Ok(self.order_repo.list_ungrouped(Some(FreightType::Standard))?)
    }

    /// 全部 EXPRESS 订单
    pub fn list_express(&self) -> ApiResult<Vec<SimplifiedOrder>> {
        Ok(self.order_repo.list_by_freight(FreightType::Express)?)
    }

    // ==========================================
    // 批量操作
    // ==========================================

    /// 批量删除订单
    pub fn batch_delete(&self, order_ids: &[String]) -> ApiResult<ActionResponse> {
        let ids = require_selection(order_ids)?;
        let affected = self.order_repo.delete_many(&ids)?;
        info!(selected = ids.len(), deleted = affected, "批量删除订单");
        Ok(ActionResponse::new(
            t_with_args("batch.deleted", &[("count", &affected.to_string())]),
            affected,
        ))
    }

    /// 批量移出分组
    pub fn batch_remove_from_groups(&self, order_ids: &[String]) -> ApiResult<ActionResponse> {
        let ids = require_selection(order_ids)?;
        let affected = self.order_repo.detach_many(&ids)?;
        Ok(ActionResponse::new(
            t_with_args("batch.removed", &[("count", &affected.to_string())]),
            affected,
        ))
    }

    // ==========================================
    // 导入记录
    // ==========================================

    /// 导入记录列表（最新在前）
    pub fn list_imported(&self, limit: Option<usize>) -> ApiResult<Vec<FullOrderRecord>> {
        Ok(self.full_order_repo.list_recent(limit)?)
    }

    /// 导入记录详情
    pub fn get_imported(&self, line_item_id: &str) -> ApiResult<FullOrderRecord> {
        self.full_order_repo
            .find_by_line_item_id(line_item_id.trim())?
            .ok_or_else(|| ApiError::NotFound(format!("导入记录(id={})不存在", line_item_id)))
    }

    /// 删除导入记录（两张表）
    pub fn delete_imported(&self, line_item_id: &str) -> ApiResult<ActionResponse> {
        let line_item_id = line_item_id.trim();
        let affected = self.full_order_repo.delete(line_item_id)?;
        if affected == 0 {
            return Err(ApiError::NotFound(format!(
                "导入记录(id={})不存在",
                line_item_id
            )));
        }
        Ok(ActionResponse::new(
            t_with_args("order.deleted", &[("id", line_item_id)]),
            affected,
        ))
    }

    // ==========================================
    // 维护
    // ==========================================

    /// 清空全部订单、分组与导入记录
    pub fn clear_all_data(&self) -> ApiResult<ActionResponse> {
        self.order_repo.clear_all()?;
        warn!("全部业务数据已清空");
        Ok(ActionResponse::new(t("admin.cleared"), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::Size;
    use crate::repository::GroupRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (OrderApi, GroupRepository) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let api = OrderApi::new(
            Arc::new(OrderRepository::from_connection(conn.clone())),
            Arc::new(FullOrderRepository::from_connection(conn.clone())),
        );
        (api, GroupRepository::from_connection(conn))
    }

    fn draft(id: &str, freight_type: FreightType) -> OrderDraft {
        OrderDraft {
            order_id: id.to_string(),
            customer_name: "Cliente".to_string(),
            product_name: "Camiseta".to_string(),
            size: Size::G,
            freight_type,
        }
    }

    #[test]
    fn test_create_writes_both_records() {
        let (api, _) = setup();
        api.create_order(&draft("PED100", FreightType::Standard)).unwrap();

        let order = api.get_order("PED100").unwrap();
        assert_eq!(order.order.size, Size::G);
        assert!(order.group_name.is_none());

        let full = api.get_imported("PED100").unwrap();
        assert_eq!(full.header.buyer_name, "Cliente");
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let (api, _) = setup();
        api.create_order(&draft("PED100", FreightType::Standard)).unwrap();
        let err = api
            .create_order(&draft("PED100", FreightType::Standard))
            .unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_create_requires_order_id() {
        let (api, _) = setup();
        let err = api.create_order(&draft("  ", FreightType::Standard)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_grouped_order_cannot_become_express() {
        let (api, groups) = setup();
        api.create_order(&draft("PED1", FreightType::Standard)).unwrap();
        let group_id = groups.create("Grupo 1").unwrap();
        groups
            .assign_orders(group_id, &["PED1".to_string()], 5)
            .unwrap();

        let update = OrderUpdate {
            customer_name: "Cliente".to_string(),
            product_name: "Camiseta".to_string(),
            size: Size::M,
            freight_type: FreightType::Express,
        };
        let err = api.update_order("PED1", &update).unwrap_err();
        assert!(matches!(err, ApiError::FreightNotGroupable { .. }));

        // 未分组订单可以改为 EXPRESS
        api.create_order(&draft("PED2", FreightType::Standard)).unwrap();
        api.update_order("PED2", &update).unwrap();
        assert_eq!(
            api.get_order("PED2").unwrap().order.freight_type,
            FreightType::Express
        );
    }

    #[test]
    fn test_list_available_splits_by_freight() {
        let (api, _) = setup();
        api.create_order(&draft("S1", FreightType::Standard)).unwrap();
        api.create_order(&draft("E1", FreightType::Express)).unwrap();

        let available = api.list_available().unwrap();
        assert_eq!(available.standard.len(), 1);
        assert_eq!(available.express.len(), 1);
        assert_eq!(api.list_express().unwrap()[0].order_id, "E1");
        assert_eq!(api.list_groupable().unwrap()[0].order_id, "S1");
    }

    #[test]
    fn test_batch_delete_and_empty_selection() {
        let (api, _) = setup();
        api.create_order(&draft("A", FreightType::Standard)).unwrap();
        api.create_order(&draft("B", FreightType::Standard)).unwrap();

        let err = api.batch_delete(&[]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let resp = api
            .batch_delete(&["A".to_string(), "B".to_string(), "Z".to_string()])
            .unwrap();
        assert_eq!(resp.affected, 2);
        assert!(api.list_orders().unwrap().is_empty());
        assert!(api.list_imported(None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_order_is_not_found() {
        let (api, _) = setup();
        assert!(matches!(
            api.delete_order("nope").unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            api.delete_imported("nope").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_clear_all_data() {
        let (api, groups) = setup();
        api.create_order(&draft("PED001", FreightType::Standard)).unwrap();
        let gid = groups.create("Grupo 1").unwrap();
        groups
            .assign_orders(gid, &["PED001".to_string()], 5)
            .unwrap();

        api.clear_all_data().unwrap();

        assert!(api.list_orders().unwrap().is_empty());
        assert!(api.list_imported(None).unwrap().is_empty());
        assert!(groups.list_with_counts().unwrap().is_empty());
    }
}
