// ==========================================
// 订单管理系统 - 订单领域模型
// ==========================================
// 对齐: customer_order 表（简化订单）/ full_order 表（完整导入记录）
// ==========================================

use crate::domain::types::{FreightType, Size};
use serde::{Deserialize, Serialize};

// ==========================================
// OrderHeader - 订单级字段
// ==========================================
// 来源: 同一订单号分桶中的第一行（权威行）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    // ===== 订单信息 =====
    pub email: String,
    pub order_date: String,
    pub order_status: String,
    pub payment_status: String,
    pub shipment_status: String,
    pub currency: String,

    // ===== 金额 =====
    pub subtotal: f64,
    pub discount: f64,
    pub shipping_value: f64,
    pub total: f64,

    // ===== 买家 =====
    pub buyer_name: String,
    pub tax_id: String,
    pub phone: String,

    // ===== 收货信息 =====
    pub shipping_name: String,
    pub shipping_phone: String,
    pub address: String,
    pub number: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub postal_code: String,
    pub state: String,
    pub country: String,

    // ===== 配送与支付 =====
    pub delivery_method: String,
    pub payment_method: String,
    pub discount_coupon: String,
    pub buyer_notes: String,
    pub seller_notes: String,
    pub payment_date: String,
    pub shipping_date: String,
}

// ==========================================
// FullOrderRecord - 完整订单记录（每个订单行一条）
// ==========================================
// 主键: line_item_id（全局唯一；冲突视为"已导入"）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullOrderRecord {
    pub line_item_id: String, // 订单号 或 订单号_<n>
    pub order_number: String, // 原始订单号
    #[serde(flatten)]
    pub header: OrderHeader,
    pub product_name: String,
    pub product_value: f64,
    pub imported_at: Option<String>, // 由数据库写入
}

// ==========================================
// SimplifiedOrder - 简化订单（系统其余部分使用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedOrder {
    pub order_id: String,
    pub customer_name: String,
    pub product_name: String,
    pub size: Size,
    pub freight_type: FreightType,
    pub group_id: Option<i64>,       // 所属发货分组（至多一个）
    pub created_at: Option<String>,  // 由数据库写入
}

impl SimplifiedOrder {
    /// 创建未分组的简化订单
    pub fn new(
        order_id: String,
        customer_name: String,
        product_name: String,
        size: Size,
        freight_type: FreightType,
    ) -> Self {
        Self {
            order_id,
            customer_name,
            product_name,
            size,
            freight_type,
            group_id: None,
            created_at: None,
        }
    }
}

/// 带分组信息的订单视图（列表/查询/导出使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithGroup {
    #[serde(flatten)]
    pub order: SimplifiedOrder,
    pub group_name: Option<String>,
    pub group_shipped: Option<bool>,
}

// ==========================================
// OrderDraft - 手工录入/编辑订单的输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_id: String,
    pub customer_name: String,
    pub product_name: String,
    pub size: Size,
    pub freight_type: FreightType,
}

/// 订单编辑输入（订单号不可修改）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub customer_name: String,
    pub product_name: String,
    pub size: Size,
    pub freight_type: FreightType,
}
