// ==========================================
// 订单管理系统 - 导入层
// ==========================================
// 职责: CSV 订单导入管道
// 流程: 编码探测 → 解析 → 列规范化 → 分组 → 映射/派生 → 落库
// ==========================================

// 模块声明
pub mod column_normalizer;
pub mod derivation;
pub mod encoding;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod order_grouper;
pub mod order_importer_impl;
pub mod order_importer_trait;
pub mod order_writer;

// 重导出核心类型
pub use column_normalizer::{ColumnNormalizerImpl, CANONICAL_COLUMNS, PORTUGUESE_HEADERS};
pub use derivation::DerivationService as DerivationServiceImpl;
pub use encoding::ChardetEncodingDetector;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{AttemptOutcome, CsvFallbackParser, ParseAttempt, ParseMode};
pub use order_grouper::OrderGrouperImpl;
pub use order_importer_impl::OrderImporterImpl;
pub use order_writer::OrderWriter;

// 重导出 Trait 接口
pub use order_importer_trait::{
    ColumnNormalizer, DerivationService, EncodingDetector, FieldMapper, FileParser, OrderGrouper,
    OrderImporter,
};
