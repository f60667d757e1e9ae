// ==========================================
// 订单管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/导入错误为用户友好的错误消息
// ==========================================

use crate::i18n::t_with_args;
use crate::importer::error::ImportError as ImporterError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 分组已满（容量上限 5）
    #[error("分组已满: group_id={group_id}, capacity={capacity}")]
    GroupFull { group_id: i64, capacity: usize },

    /// EXPRESS 订单不能加入分组
    #[error("加急订单不能分组: order_id={order_id}")]
    FreightNotGroupable { order_id: String },

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("不支持的文件: {0}")]
    UnsupportedFile(String),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向用户的本地化消息（跟随当前语言）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::GroupFull { group_id, capacity } => t_with_args(
                "group.full",
                &[
                    ("group_id", &group_id.to_string()),
                    ("capacity", &capacity.to_string()),
                ],
            ),
            ApiError::FreightNotGroupable { order_id } => {
                t_with_args("group.express_not_allowed", &[("order_id", order_id)])
            }
            ApiError::UnsupportedFile(name) => {
                t_with_args("import.unsupported_file", &[("name", name)])
            }
            ApiError::MissingColumns(columns) => t_with_args(
                "import.missing_columns",
                &[("columns", &columns.join(", "))],
            ),
            ApiError::ImportError(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::GroupFull { group_id, capacity } => {
                ApiError::GroupFull { group_id, capacity }
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImporterError> for ApiError {
    fn from(err: ImporterError) -> Self {
        match err {
            ImporterError::FileNotFound(path) => ApiError::NotFound(t_with_args(
                "import.file_not_found",
                &[("path", &path)],
            )),
            ImporterError::UnsupportedFormat(name) => ApiError::UnsupportedFile(name),
            ImporterError::EmptyFile => ApiError::InvalidInput(crate::i18n::t("import.empty_file")),
            ImporterError::FileUnreadable { attempts } => ApiError::ImportError(t_with_args(
                "import.unreadable",
                &[("attempts", &attempts.to_string())],
            )),
            ImporterError::MissingColumns(columns) => ApiError::MissingColumns(columns),
            ImporterError::TypeConversionError { .. } => ApiError::ValidationError(err.to_string()),
            ImporterError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            ImporterError::ConfigReadError { .. } => ApiError::InternalError(err.to_string()),
            other => ApiError::ImportError(t_with_args(
                "import.failed",
                &[("error", &other.to_string())],
            )),
        }
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
