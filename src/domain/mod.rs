// ==========================================
// 订单管理系统 - 领域层
// ==========================================
// 职责: 实体、值类型与导入管道的数据结构
// ==========================================

pub mod group;
pub mod import;
pub mod order;
pub mod types;

pub use group::{GroupWithCount, GroupWithOrders, ShipmentGroup, MAX_GROUP_SIZE};
pub use import::{
    GroupingReport, ImportBatch, ImportReport, ImportSummary, LineItemOutcome, OrderBucket,
    ParsedTable, PreparedLineItem, RawRow,
};
pub use order::{
    FullOrderRecord, OrderDraft, OrderHeader, OrderUpdate, OrderWithGroup, SimplifiedOrder,
};
pub use types::{FreightType, Size};
