// ==========================================
// 订单管理系统 - 导出 API
// ==========================================
// 职责: 导出分组订单与加急订单为 CSV
// 列: TYPE, ORDER_ID, CUSTOMER, PRODUCT, SIZE, FREIGHT, GROUP, SHIPPED, DATE
// 顺序: 先 GROUP 行（按分组、创建时间），后 EXPRESS 行
// ==========================================

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::OrderWithGroup;
use crate::domain::types::FreightType;
use crate::repository::OrderRepository;

/// 导出表头
pub const EXPORT_HEADERS: [&str; 9] = [
    "TYPE", "ORDER_ID", "CUSTOMER", "PRODUCT", "SIZE", "FREIGHT", "GROUP", "SHIPPED", "DATE",
];

/// 导出行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub row_type: String,
    pub order_id: String,
    pub customer: String,
    pub product: String,
    pub size: String,
    pub freight: String,
    pub group: String,
    pub shipped: String,
    pub date: String,
}

impl ExportRow {
    fn from_order(row_type: &str, item: &OrderWithGroup, group: String, shipped: &str) -> Self {
        let order = &item.order;
        Self {
            row_type: row_type.to_string(),
            order_id: order.order_id.clone(),
            customer: order.customer_name.clone(),
            product: order.product_name.clone(),
            size: order.size.to_string(),
            freight: order.freight_type.to_string(),
            group,
            shipped: shipped.to_string(),
            date: order.created_at.clone().unwrap_or_default(),
        }
    }

    fn as_record(&self) -> [&str; 9] {
        [
            self.row_type.as_str(),
            self.order_id.as_str(),
            self.customer.as_str(),
            self.product.as_str(),
            self.size.as_str(),
            self.freight.as_str(),
            self.group.as_str(),
            self.shipped.as_str(),
            self.date.as_str(),
        ]
    }
}

/// 导出文件
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// 由订单列表生成导出行
pub fn build_export_rows(orders: &[OrderWithGroup]) -> Vec<ExportRow> {
    let mut grouped: Vec<&OrderWithGroup> =
        orders.iter().filter(|o| o.order.group_id.is_some()).collect();
    grouped.sort_by(|a, b| {
        (a.order.group_id, &a.order.created_at, &a.order.order_id).cmp(&(
            b.order.group_id,
            &b.order.created_at,
            &b.order.order_id,
        ))
    });

    let mut express: Vec<&OrderWithGroup> = orders
        .iter()
        .filter(|o| o.order.freight_type == FreightType::Express)
        .collect();
    express.sort_by(|a, b| {
        (&a.order.created_at, &a.order.order_id).cmp(&(&b.order.created_at, &b.order.order_id))
    });

    let group_rows = grouped.into_iter().map(|o| {
        let shipped = if o.group_shipped.unwrap_or(false) {
            "YES"
        } else {
            "NO"
        };
        ExportRow::from_order("GROUP", o, o.group_name.clone().unwrap_or_default(), shipped)
    });
    let express_rows = express
        .into_iter()
        .map(|o| ExportRow::from_order("EXPRESS", o, String::new(), "N/A"));

    group_rows.chain(express_rows).collect()
}

/// 写出 CSV 字节
pub fn write_csv(rows: &[ExportRow]) -> ApiResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    for row in rows {
        writer
            .write_record(row.as_record())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::InternalError(e.to_string()))
}

// ==========================================
// ExportApi - 导出 API
// ==========================================
pub struct ExportApi {
    order_repo: Arc<OrderRepository>,
}

impl ExportApi {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 导出 CSV（文件名 orders_<YYYYmmdd_HHMMSS>.csv）
    pub fn export_csv(&self) -> ApiResult<ExportFile> {
        let orders = self.order_repo.list_all_with_group()?;
        let rows = build_export_rows(&orders);
        let content = write_csv(&rows)?;
        let file_name = format!("orders_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));

        info!(rows = rows.len(), file_name = %file_name, "订单导出完成");
        Ok(ExportFile { file_name, content })
    }
}
