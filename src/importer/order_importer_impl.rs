// ==========================================
// 订单管理系统 - 订单导入器实现
// ==========================================
// 职责: 整合导入流程，从上传字节到数据库
// 流程: 编码探测 → 解析（回退链）→ 列规范化 → 订单分组 → 映射/派生 → 落库 → 批次日志
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{ImportBatch, ImportReport};
use crate::importer::column_normalizer::ColumnNormalizerImpl;
use crate::importer::derivation::DerivationService as DerivationServiceImpl;
use crate::importer::encoding::ChardetEncodingDetector;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::{CsvFallbackParser, ParseAttempt};
use crate::importer::order_grouper::OrderGrouperImpl;
use crate::importer::order_importer_trait::{
    ColumnNormalizer, DerivationService, EncodingDetector, FieldMapper, FileParser, OrderGrouper,
    OrderImporter,
};
use crate::importer::order_writer::OrderWriter;
use crate::repository::OrderImportRepository;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// OrderImporterImpl - 订单导入器实现
// ==========================================
pub struct OrderImporterImpl<R, C>
where
    R: OrderImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    encoding_detector: Box<dyn EncodingDetector>,
    file_parser: Box<dyn FileParser>,
    column_normalizer: Box<dyn ColumnNormalizer>,
    order_grouper: Box<dyn OrderGrouper>,
    field_mapper: Box<dyn FieldMapper>,
    derivation_service: Box<dyn DerivationService>,
}

impl<R, C> OrderImporterImpl<R, C>
where
    R: OrderImportRepository,
    C: ImportConfigReader,
{
    /// 创建新的 OrderImporter 实例
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    /// - encoding_detector: 编码探测器
    /// - file_parser: 表格解析器
    /// - column_normalizer: 列规范化器
    /// - order_grouper: 订单分组器
    /// - field_mapper: 字段映射器
    /// - derivation_service: 字段派生服务
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        import_repo: R,
        config: C,
        encoding_detector: Box<dyn EncodingDetector>,
        file_parser: Box<dyn FileParser>,
        column_normalizer: Box<dyn ColumnNormalizer>,
        order_grouper: Box<dyn OrderGrouper>,
        field_mapper: Box<dyn FieldMapper>,
        derivation_service: Box<dyn DerivationService>,
    ) -> Self {
        Self {
            import_repo,
            config,
            encoding_detector,
            file_parser,
            column_normalizer,
            order_grouper,
            field_mapper,
            derivation_service,
        }
    }

    /// 使用默认组件创建导入器
    pub fn with_default_components(import_repo: R, config: C) -> Self {
        Self::new(
            import_repo,
            config,
            Box::new(ChardetEncodingDetector),
            Box::new(CsvFallbackParser),
            Box::new(ColumnNormalizerImpl::new()),
            Box::new(OrderGrouperImpl),
            Box::new(FieldMapperImpl),
            Box::new(DerivationServiceImpl),
        )
    }

    /// 查询最近的导入批次
    pub async fn recent_batches(&self, limit: usize) -> ImportResult<Vec<ImportBatch>> {
        Ok(self.import_repo.list_recent_batches(limit).await?)
    }
}

#[async_trait::async_trait]
impl<R, C> OrderImporter for OrderImporterImpl<R, C>
where
    R: OrderImportRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes), fields(batch_id, size = bytes.len()))]
    async fn import_from_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_name = %file_name, "开始导入订单数据");

        if bytes.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        // === 步骤 1: 编码探测 + 构建尝试计划 ===
        debug!("步骤 1: 编码探测");
        let detected = self.encoding_detector.detect(bytes);
        let fallback = self.config.get_fallback_encodings().await?;
        let lenient = self.config.get_lenient_encodings().await?;
        let attempts = ParseAttempt::plan(detected, &fallback, &lenient);
        debug!(detected = detected.name(), attempts = attempts.len(), "尝试计划已生成");

        // === 步骤 2: 解析文件 ===
        debug!("步骤 2: 解析文件");
        let table = self.file_parser.parse(bytes, &attempts).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        let total_rows = table.row_count();
        let encoding = table.encoding.clone();
        let delimiter = table.delimiter.to_string();
        let skipped_lines = table.skipped_lines;

        // === 步骤 3: 列规范化 + 必需列校验 ===
        debug!("步骤 3: 列规范化");
        let table = self.column_normalizer.normalize(table)?;

        // === 步骤 4: 订单分组 ===
        debug!("步骤 4: 订单分组");
        let grouping = self.order_grouper.group(table.rows);
        info!(
            orders = grouping.buckets.len(),
            valid_rows = grouping.valid_rows,
            skipped_rows = grouping.skipped_rows,
            "订单分组完成"
        );

        // === 步骤 5: 映射/派生 + 落库 ===
        debug!("步骤 5: 落库");
        let express_keyword = self.config.get_express_keyword().await?;
        let writer = OrderWriter::new(
            self.field_mapper.as_ref(),
            self.derivation_service.as_ref(),
            &express_keyword,
        );
        let mut summary = writer.write(&self.import_repo, &grouping.buckets).await?;
        summary.valid_rows = grouping.valid_rows;
        summary.skipped_rows = grouping.skipped_rows;
        summary.skipped_lines = skipped_lines;

        // === 步骤 6: 批次日志 ===
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            file_name: file_name.to_string(),
            encoding,
            delimiter,
            total_rows,
            valid_rows: summary.valid_rows,
            skipped_rows: summary.skipped_rows,
            skipped_lines: summary.skipped_lines,
            imported: summary.imported,
            duplicated: summary.duplicated,
            errored: summary.errored,
            elapsed_ms: start_time.elapsed().as_millis() as i64,
            imported_at: None,
        };
        if let Err(e) = self.import_repo.insert_batch(&batch).await {
            // 订单已提交，批次日志失败不影响导入结果
            warn!(batch_id = %batch_id, error = %e, "导入批次日志写入失败");
        }

        info!(
            batch_id = %batch_id,
            imported = summary.imported,
            duplicated = summary.duplicated,
            errored = summary.errored,
            skipped_lines = summary.skipped_lines,
            elapsed_ms = batch.elapsed_ms,
            "订单导入完成"
        );

        Ok(ImportReport { batch, summary })
    }

    #[instrument(skip(self, file_path))]
    async fn import_from_path<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            return Err(ImportError::UnsupportedFormat(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        self.import_from_bytes(&file_name, &bytes).await
    }
}
