use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;

// ==========================================
// 公共工具：错误映射
// ==========================================

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息（本地化）
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// 将ApiError转换为错误响应体
pub fn map_api_error(err: &ApiError) -> ErrorResponse {
    ErrorResponse {
        code: match err {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
            ApiError::GroupFull { .. } => "GROUP_FULL",
            ApiError::FreightNotGroupable { .. } => "FREIGHT_NOT_GROUPABLE",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::UnsupportedFile(_) => "UNSUPPORTED_FILE",
            ApiError::MissingColumns(_) => "MISSING_COLUMNS",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
        .to_string(),
        message: err.user_message(),
        details: match err {
            ApiError::GroupFull { group_id, capacity } => Some(serde_json::json!({
                "group_id": group_id,
                "capacity": capacity,
            })),
            ApiError::FreightNotGroupable { order_id } => {
                Some(serde_json::json!({ "order_id": order_id }))
            }
            ApiError::MissingColumns(columns) => Some(serde_json::json!({ "columns": columns })),
            _ => None,
        },
    }
}

/// HTTP 状态码
pub fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::InvalidInput(_) | ApiError::UnsupportedFile(_) | ApiError::ValidationError(_) => {
            StatusCode::BAD_REQUEST
        }
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::BusinessRuleViolation(_)
        | ApiError::GroupFull { .. }
        | ApiError::FreightNotGroupable { .. } => StatusCode::CONFLICT,
        ApiError::ImportError(_) | ApiError::MissingColumns(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::DatabaseError(_)
        | ApiError::DatabaseConnectionError(_)
        | ApiError::InternalError(_)
        | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "请求被拒绝");
        }
        (status, Json(map_api_error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_full_response() {
        let err = ApiError::GroupFull {
            group_id: 2,
            capacity: 5,
        };
        assert_eq!(status_for(&err), StatusCode::CONFLICT);
        let body = map_api_error(&err);
        assert_eq!(body.code, "GROUP_FULL");
        assert_eq!(body.details, Some(serde_json::json!({"group_id": 2, "capacity": 5})));
    }

    #[test]
    fn test_server_errors() {
        let err = ApiError::DatabaseError("disk I/O error".to_string());
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(map_api_error(&err).details.is_none());
    }
}
