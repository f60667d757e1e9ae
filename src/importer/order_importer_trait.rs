// ==========================================
// 订单管理系统 - 订单导入 Trait
// ==========================================
// 职责: 定义订单导入主接口与各阶段接口（不包含实现）
// 流程: 编码探测 → 表格解析 → 列规范化 → 订单分组 → 字段映射/派生 → 落库
// ==========================================

use crate::domain::import::{GroupingReport, ImportReport, ParsedTable, RawRow};
use crate::domain::order::OrderHeader;
use crate::domain::types::{FreightType, Size};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::ParseAttempt;
use async_trait::async_trait;
use encoding_rs::Encoding;
use std::path::Path;

// ==========================================
// OrderImporter Trait
// ==========================================
// 用途: 订单导入主接口
// 实现者: OrderImporterImpl
#[async_trait]
pub trait OrderImporter: Send + Sync {
    /// 从上传内容导入订单
    ///
    /// # 参数
    /// - file_name: 原始文件名（只用于批次日志）
    /// - bytes: 文件原始字节
    ///
    /// # 返回
    /// - Ok(ImportReport): 批次记录 + 汇总（imported / duplicated / errored）
    /// - Err: 文件为空、无法解析、缺少必需列、数据库连接错误
    ///
    /// # 说明
    /// - 单行错误（订单号为空、重复、写入异常）只计数，不中断导入
    async fn import_from_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportReport>;

    /// 从磁盘文件导入订单
    ///
    /// # 参数
    /// - file_path: CSV 文件路径（.csv）
    async fn import_from_path<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// EncodingDetector Trait
// ==========================================
// 用途: 猜测上传内容的文本编码
// 实现者: ChardetEncodingDetector
pub trait EncodingDetector: Send + Sync {
    /// 返回最可能的编码（BOM 优先）
    fn detect(&self, bytes: &[u8]) -> &'static Encoding;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 字节 → 表格（按尝试计划依次解析）
// 实现者: CsvFallbackParser
pub trait FileParser: Send + Sync {
    /// 依次执行解析尝试，首个成功的结果胜出
    ///
    /// # 返回
    /// - Ok(ParsedTable): 表头 + 数据行
    /// - Err(EmptyFile): 内容为空
    /// - Err(FileUnreadable): 全部尝试均失败
    fn parse(&self, bytes: &[u8], attempts: &[ParseAttempt]) -> ImportResult<ParsedTable>;
}

// ==========================================
// ColumnNormalizer Trait
// ==========================================
// 用途: 单列表格拆分 + 列名规范化 + 必需列校验
// 实现者: ColumnNormalizerImpl
pub trait ColumnNormalizer: Send + Sync {
    /// 规范化表格列
    ///
    /// # 返回
    /// - Ok(ParsedTable): 列名已规范化的表格
    /// - Err(MissingColumns): 缺少必需列（按标准列顺序列出）
    fn normalize(&self, table: ParsedTable) -> ImportResult<ParsedTable>;
}

// ==========================================
// OrderGrouper Trait
// ==========================================
// 用途: 按订单号分桶（桶内保持行序）
// 实现者: OrderGrouperImpl
pub trait OrderGrouper: Send + Sync {
    fn group(&self, rows: Vec<RawRow>) -> GroupingReport;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: RawRow → 订单级字段 / 商品字段
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 映射订单级字段（取自分桶第一行）
    ///
    /// # 参数
    /// - row: 原始行
    /// - row_number: 行号（用于错误定位）
    fn map_header(&self, row: &RawRow, row_number: usize) -> ImportResult<OrderHeader>;

    /// 映射商品字段（名称, 金额）
    fn map_product(&self, row: &RawRow, row_number: usize) -> ImportResult<(String, f64)>;
}

// ==========================================
// DerivationService Trait
// ==========================================
// 用途: 简化订单的派生字段
// 实现者: DerivationServiceImpl
pub trait DerivationService: Send + Sync {
    /// 运费类型：配送方式包含关键字（大小写不敏感）→ EXPRESS
    fn derive_freight_type(&self, delivery_method: &str, express_keyword: &str) -> FreightType;

    /// 尺码：从商品名称识别，默认 M
    fn derive_size(&self, product_name: &str) -> Size;

    /// 订单行标识：第一行为订单号，其余为 订单号_<序号+1>
    fn derive_line_item_id(&self, order_number: &str, index: usize) -> String;
}
