// ==========================================
// 订单管理系统 - 订单导入 API
// ==========================================
// 职责: 上传校验 + 调用导入管道 + 生成本地化汇总消息
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::import::{ImportBatch, ImportReport, ImportSummary};
use crate::i18n::{t, t_with_args};
use crate::importer::{OrderImporter, OrderImporterImpl};
use crate::repository::OrderImportRepositoryImpl;

/// 默认组件组装的订单导入器
pub type DefaultOrderImporter = OrderImporterImpl<OrderImportRepositoryImpl, ConfigManager>;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 本地化汇总消息（导入/重复/错误三个计数）
    pub message: String,
    /// 汇总计数
    pub summary: ImportSummary,
    /// 批次记录
    pub batch: ImportBatch,
}

impl ImportApiResponse {
    fn from_report(report: ImportReport) -> Self {
        let message = t_with_args(
            "import.summary",
            &[
                ("imported", &report.summary.imported.to_string()),
                ("duplicated", &report.summary.duplicated.to_string()),
                ("errored", &report.summary.errored.to_string()),
            ],
        );
        Self {
            message,
            summary: report.summary,
            batch: report.batch,
        }
    }
}

/// 上传文件名是否为 .csv（大小写不敏感）
pub fn is_csv_file_name(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

// ==========================================
// ImportApi - 订单导入 API
// ==========================================
pub struct ImportApi {
    importer: Arc<DefaultOrderImporter>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - importer: 订单导入器
    pub fn new(importer: Arc<DefaultOrderImporter>) -> Self {
        Self { importer }
    }

    /// 导入上传的文件
    ///
    /// # 参数
    /// - file_name: 上传文件名（None 表示未选择文件）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入汇总
    /// - Err(ApiError): 未选择文件 / 非 CSV / 文件不可读 / 缺少列
    pub async fn import_upload(
        &self,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> ApiResult<ImportApiResponse> {
        let file_name = match file_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ApiError::InvalidInput(t("import.no_file"))),
        };

        if !is_csv_file_name(file_name) {
            warn!(file_name = %file_name, "拒绝非 CSV 文件");
            return Err(ApiError::UnsupportedFile(file_name.to_string()));
        }

        let report = self.importer.import_from_bytes(file_name, bytes).await?;
        info!(
            batch_id = %report.batch.batch_id,
            imported = report.summary.imported,
            "上传导入完成"
        );
        Ok(ImportApiResponse::from_report(report))
    }

    /// 导入本地路径上的文件（命令行/运维使用）
    pub async fn import_path(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        let report = self.importer.import_from_path(file_path).await?;
        Ok(ImportApiResponse::from_report(report))
    }

    /// 查询最近的导入批次
    pub async fn list_recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        Ok(self.importer.recent_batches(limit).await?)
    }
}
