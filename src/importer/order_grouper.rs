// ==========================================
// 订单管理系统 - 订单分组
// ==========================================
// 职责: 按订单号分桶
// 规则:
// - 订单号为空、空白或文本 "nan" 的行跳过并计数
// - 桶内保持文件行序（第一行为订单级字段的权威来源）
// ==========================================

use crate::domain::import::{GroupingReport, OrderBucket, RawRow};
use crate::importer::order_importer_trait::OrderGrouper;
use std::collections::HashMap;
use tracing::debug;

/// 订单号列
pub const ORDER_NUMBER_COLUMN: &str = "Order Number";

/// 提取有效订单号
pub fn valid_order_number(row: &RawRow) -> Option<String> {
    let value = row.get(ORDER_NUMBER_COLUMN)?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value.to_string())
    }
}

pub struct OrderGrouperImpl;

impl OrderGrouper for OrderGrouperImpl {
    fn group(&self, rows: Vec<RawRow>) -> GroupingReport {
        let mut report = GroupingReport::default();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let order_number = match valid_order_number(&row) {
                Some(n) => n,
                None => {
                    report.skipped_rows += 1;
                    debug!(row_number = idx + 1, "订单号为空，跳过该行");
                    continue;
                }
            };

            report.valid_rows += 1;
            match index.get(&order_number) {
                Some(&pos) => report.buckets[pos].rows.push(row),
                None => {
                    index.insert(order_number.clone(), report.buckets.len());
                    report.buckets.push(OrderBucket {
                        order_number,
                        rows: vec![row],
                    });
                }
            }
        }

        report
    }
}
