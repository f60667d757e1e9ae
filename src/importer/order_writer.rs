// ==========================================
// 订单管理系统 - 订单写入器
// ==========================================
// 职责: 订单分桶 → 待写入订单行（完整记录 + 简化订单）→ 落库 → 计数
// 规则:
// - 订单级字段取自分桶第一行；运费类型每个订单只派生一次
// - 映射失败的订单行计为 errored，继续处理下一行/下一个订单
// - 计数由返回值累加，不使用外部可变状态
// ==========================================

use crate::domain::import::{ImportSummary, OrderBucket, PreparedLineItem};
use crate::domain::order::{FullOrderRecord, SimplifiedOrder};
use crate::importer::error::ImportResult;
use crate::importer::order_importer_trait::{DerivationService, FieldMapper};
use crate::repository::OrderImportRepository;
use tracing::{debug, info, warn};

/// 映射阶段的结果
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub items: Vec<PreparedLineItem>,
    pub errored: usize,
}

pub struct OrderWriter<'a> {
    field_mapper: &'a dyn FieldMapper,
    derivation: &'a dyn DerivationService,
    express_keyword: &'a str,
}

impl<'a> OrderWriter<'a> {
    pub fn new(
        field_mapper: &'a dyn FieldMapper,
        derivation: &'a dyn DerivationService,
        express_keyword: &'a str,
    ) -> Self {
        Self {
            field_mapper,
            derivation,
            express_keyword,
        }
    }

    /// 将一个订单分桶映射为订单行
    ///
    /// # 返回
    /// - (订单行, 映射失败的行数)
    pub fn prepare_bucket(&self, bucket: &OrderBucket) -> (Vec<PreparedLineItem>, usize) {
        let first = match bucket.rows.first() {
            Some(row) => row,
            None => return (Vec::new(), 0),
        };

        let header = match self.field_mapper.map_header(first, 1) {
            Ok(h) => h,
            Err(e) => {
                warn!(order_number = %bucket.order_number, error = %e, "订单级字段映射失败");
                return (Vec::new(), bucket.rows.len());
            }
        };
        let freight_type = self
            .derivation
            .derive_freight_type(&header.delivery_method, self.express_keyword);

        let mut items = Vec::with_capacity(bucket.rows.len());
        let mut errored = 0;

        for (idx, row) in bucket.rows.iter().enumerate() {
            let (product_name, product_value) = match self.field_mapper.map_product(row, idx + 1) {
                Ok(p) => p,
                Err(e) => {
                    warn!(order_number = %bucket.order_number, item = idx + 1, error = %e, "订单行映射失败");
                    errored += 1;
                    continue;
                }
            };

            let line_item_id = self
                .derivation
                .derive_line_item_id(&bucket.order_number, idx);
            let size = self.derivation.derive_size(&product_name);

            items.push(PreparedLineItem {
                full: FullOrderRecord {
                    line_item_id: line_item_id.clone(),
                    order_number: bucket.order_number.clone(),
                    header: header.clone(),
                    product_name: product_name.clone(),
                    product_value,
                    imported_at: None,
                },
                order: SimplifiedOrder::new(
                    line_item_id,
                    header.buyer_name.clone(),
                    product_name,
                    size,
                    freight_type,
                ),
            });
        }

        (items, errored)
    }

    /// 映射全部订单分桶
    pub fn prepare(&self, buckets: &[OrderBucket]) -> PreparedBatch {
        let mut batch = PreparedBatch::default();
        for bucket in buckets {
            let (items, errored) = self.prepare_bucket(bucket);
            batch.items.extend(items);
            batch.errored += errored;
        }
        debug!(items = batch.items.len(), errored = batch.errored, "订单行映射完成");
        batch
    }

    /// 映射并写入，返回计数
    pub async fn write<R>(&self, repo: &R, buckets: &[OrderBucket]) -> ImportResult<ImportSummary>
    where
        R: OrderImportRepository + ?Sized,
    {
        let prepared = self.prepare(buckets);

        let mut summary = ImportSummary {
            errored: prepared.errored,
            distinct_orders: buckets.len(),
            ..Default::default()
        };

        let outcomes = repo.insert_line_items(prepared.items).await?;
        for outcome in &outcomes {
            summary.record(outcome);
        }

        info!(
            imported = summary.imported,
            duplicated = summary.duplicated,
            errored = summary.errored,
            "订单写入完成"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::RawRow;
    use crate::domain::types::{FreightType, Size};
    use crate::importer::derivation::DerivationService as DerivationServiceImpl;
    use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prepare_bucket_uses_first_row_for_order_fields() {
        let bucket = OrderBucket {
            order_number: "1001".to_string(),
            rows: vec![
                row(&[
                    ("Buyer Name", "Ana Lima"),
                    ("Delivery Method", "Sedex Expresso"),
                    ("Product Name", "Camiseta GG"),
                    ("Product Value", "79,90"),
                ]),
                row(&[
                    ("Buyer Name", "Outro Nome"),
                    ("Delivery Method", "PAC"),
                    ("Product Name", "Boné"),
                    ("Product Value", "30"),
                ]),
            ],
        };

        let mapper = FieldMapperImpl;
        let derivation = DerivationServiceImpl;
        let writer = OrderWriter::new(&mapper, &derivation, "express");
        let (items, errored) = writer.prepare_bucket(&bucket);

        assert_eq!(errored, 0);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_item_id(), "1001");
        assert_eq!(items[1].line_item_id(), "1001_2");
        assert_eq!(items[1].order.customer_name, "Ana Lima");
        assert_eq!(items[1].order.freight_type, FreightType::Express);
        assert_eq!(items[0].order.size, Size::GG);
        assert_eq!(items[1].order.size, Size::M);
        assert_eq!(items[1].full.product_value, 30.0);
    }

    #[test]
    fn test_bad_line_item_counts_as_error() {
        let bucket = OrderBucket {
            order_number: "2001".to_string(),
            rows: vec![
                row(&[("Product Name", "Blusa P"), ("Product Value", "??")]),
                row(&[("Product Name", "Blusa M"), ("Product Value", "10")]),
            ],
        };

        let mapper = FieldMapperImpl;
        let derivation = DerivationServiceImpl;
        let writer = OrderWriter::new(&mapper, &derivation, "express");
        let batch = writer.prepare(&[bucket]);

        assert_eq!(batch.errored, 1);
        assert_eq!(batch.items.len(), 1);
        // 序号按文件行位置派生
        assert_eq!(batch.items[0].line_item_id(), "2001_2");
    }
}
