// ==========================================
// 订单管理系统 - 字段映射器实现
// ==========================================
// 职责: 标准列 → OrderHeader / 商品字段 + 类型转换
// 规则:
// - 文本: 去空白；"nan" 视为空
// - 金额: 空/"nan" → 0.0；兼容 "1.234,56" 与 "R$ 59,90"
// ==========================================

use crate::domain::import::RawRow;
use crate::domain::order::OrderHeader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::FieldMapper as FieldMapperTrait;

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn map_header(&self, row: &RawRow, row_number: usize) -> ImportResult<OrderHeader> {
        Ok(OrderHeader {
            // 订单信息
            email: self.get_text(row, "Email"),
            order_date: self.get_text(row, "Date"),
            order_status: self.get_text(row, "Order Status"),
            payment_status: self.get_text(row, "Payment Status"),
            shipment_status: self.get_text(row, "Shipment Status"),
            currency: self.get_text(row, "Currency"),

            // 金额
            subtotal: self.parse_amount(row, "Subtotal", row_number)?,
            discount: self.parse_amount(row, "Discount", row_number)?,
            shipping_value: self.parse_amount(row, "Shipping Value", row_number)?,
            total: self.parse_amount(row, "Total", row_number)?,

            // 买家
            buyer_name: self.get_text(row, "Buyer Name"),
            tax_id: self.get_text(row, "Tax ID"),
            phone: self.get_text(row, "Phone"),

            // 收货信息
            shipping_name: self.get_text(row, "Shipping Name"),
            shipping_phone: self.get_text(row, "Shipping Phone"),
            address: self.get_text(row, "Address"),
            number: self.get_text(row, "Number"),
            complement: self.get_text(row, "Complement"),
            neighborhood: self.get_text(row, "Neighborhood"),
            city: self.get_text(row, "City"),
            postal_code: self.get_text(row, "Postal Code"),
            state: self.get_text(row, "State"),
            country: self.get_text(row, "Country"),

            // 配送与支付
            delivery_method: self.get_text(row, "Delivery Method"),
            payment_method: self.get_text(row, "Payment Method"),
            discount_coupon: self.get_text(row, "Discount Coupon"),
            buyer_notes: self.get_text(row, "Buyer Notes"),
            seller_notes: self.get_text(row, "Seller Notes"),
            payment_date: self.get_text(row, "Payment Date"),
            shipping_date: self.get_text(row, "Shipping Date"),
        })
    }

    fn map_product(&self, row: &RawRow, row_number: usize) -> ImportResult<(String, f64)> {
        Ok((
            self.get_text(row, "Product Name"),
            self.parse_amount(row, "Product Value", row_number)?,
        ))
    }
}

impl FieldMapper {
    /// 提取文本字段（缺失或 "nan" → 空字符串）
    fn get_text(&self, row: &RawRow, key: &str) -> String {
        match row.get(key).map(|v| v.trim()) {
            Some(v) if !v.eq_ignore_ascii_case("nan") => v.to_string(),
            _ => String::new(),
        }
    }

    /// 解析金额
    fn parse_amount(&self, row: &RawRow, key: &str, row_number: usize) -> ImportResult<f64> {
        let raw = self.get_text(row, key);
        if raw.is_empty() {
            return Ok(0.0);
        }

        parse_decimal(&raw).ok_or_else(|| ImportError::TypeConversionError {
            row: row_number,
            field: key.to_string(),
            message: format!("无法解析为金额: {}", raw),
        })
    }
}

/// 解析十进制数（兼容千分位与小数逗号）
///
/// # 规则
/// - 同时出现 ',' 与 '.' 时，靠后的为小数点，另一个为千分位
/// - 只有 ',' 时视为小数点
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(v) = cleaned.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => return None,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
