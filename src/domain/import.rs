// ==========================================
// 订单管理系统 - 导入领域模型
// ==========================================
// 职责: CSV 导入管道各阶段之间传递的数据结构
// 生命周期: RawRow / ParsedTable / OrderBucket 只在一次导入内存在
// ==========================================

use crate::domain::order::{FullOrderRecord, SimplifiedOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始行：列名 -> 原始文本
pub type RawRow = HashMap<String, String>;

// ==========================================
// ParsedTable - 解析成功的表格
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub headers: Vec<String>,     // 有序列名
    pub rows: Vec<RawRow>,        // 数据行
    pub encoding: String,         // 成功解码所用编码
    pub delimiter: char,          // 成功解析所用分隔符
    pub skipped_lines: usize,     // 结构错误而跳过的行数
}

impl ParsedTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// OrderBucket - 同一订单号的行（保持行序）
// ==========================================
// 第一行为订单级字段的权威来源
#[derive(Debug, Clone)]
pub struct OrderBucket {
    pub order_number: String,
    pub rows: Vec<RawRow>,
}

/// 分组结果
#[derive(Debug, Clone, Default)]
pub struct GroupingReport {
    pub buckets: Vec<OrderBucket>,
    pub valid_rows: usize,
    pub skipped_rows: usize, // 订单号为空/nan 的行
}

/// 一个订单行准备写入的两条记录
#[derive(Debug, Clone)]
pub struct PreparedLineItem {
    pub full: FullOrderRecord,
    pub order: SimplifiedOrder,
}

impl PreparedLineItem {
    pub fn line_item_id(&self) -> &str {
        &self.full.line_item_id
    }
}

/// 单个订单行的写入结果
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemOutcome {
    Inserted,       // 两条记录均已写入
    Duplicate,      // 标识已存在，整体跳过
    Failed(String), // 写入异常，整体跳过
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub duplicated: usize,
    pub errored: usize,
    pub skipped_rows: usize,
    pub skipped_lines: usize, // 解析阶段丢弃的坏行
    pub valid_rows: usize,
    pub distinct_orders: usize,
}

impl ImportSummary {
    /// 累加单个订单行的写入结果
    pub fn record(&mut self, outcome: &LineItemOutcome) {
        match outcome {
            LineItemOutcome::Inserted => self.imported += 1,
            LineItemOutcome::Duplicate => self.duplicated += 1,
            LineItemOutcome::Failed(_) => self.errored += 1,
        }
    }
}

// ==========================================
// ImportBatch - 导入批次日志
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: String,
    pub encoding: String,
    pub delimiter: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub skipped_rows: usize,
    pub skipped_lines: usize,
    pub imported: usize,
    pub duplicated: usize,
    pub errored: usize,
    pub elapsed_ms: i64,
    pub imported_at: Option<String>,
}

/// 一次导入的完整结果（汇总 + 批次记录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch: ImportBatch,
    pub summary: ImportSummary,
}
