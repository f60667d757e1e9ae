// ==========================================
// 订单管理系统 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新（含界面语言切换）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::parse_string_list;
use crate::config::{config_defaults, config_keys, ConfigManager};
use crate::i18n;

/// 配置项（含默认值回显）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
    /// 是否为默认值（config_kv 中无记录）
    pub is_default: bool,
    pub updated_at: Option<String>,
}

fn default_value(key: &str) -> String {
    match key {
        config_keys::IMPORT_FALLBACK_ENCODINGS => {
            serde_json::json!(config_defaults::FALLBACK_ENCODINGS).to_string()
        }
        config_keys::IMPORT_LENIENT_ENCODINGS => {
            serde_json::json!(config_defaults::LENIENT_ENCODINGS).to_string()
        }
        config_keys::IMPORT_EXPRESS_KEYWORD => config_defaults::EXPRESS_KEYWORD.to_string(),
        config_keys::UI_LOCALE => config_defaults::UI_LOCALE.to_string(),
        _ => String::new(),
    }
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已知配置（未存储的显示默认值）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let stored = self.config_manager.list_config_entries()?;

        Ok(config_keys::ALL
            .iter()
            .map(|key| match stored.iter().find(|e| e.key == *key) {
                Some(entry) => ConfigItem {
                    key: entry.key.clone(),
                    value: entry.value.clone(),
                    is_default: false,
                    updated_at: entry.updated_at.clone(),
                },
                None => ConfigItem {
                    key: key.to_string(),
                    value: default_value(key),
                    is_default: true,
                    updated_at: None,
                },
            })
            .collect())
    }

    /// 更新单个配置
    ///
    /// # 返回
    /// - Err(InvalidInput): 未知键或值格式错误
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<ConfigItem> {
        let key = key.trim();
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }

        let value = value.trim();
        match key {
            config_keys::IMPORT_FALLBACK_ENCODINGS | config_keys::IMPORT_LENIENT_ENCODINGS => {
                if parse_string_list(value).is_none() {
                    return Err(ApiError::InvalidInput(format!(
                        "{} 需要非空 JSON 字符串数组",
                        key
                    )));
                }
            }
            config_keys::IMPORT_EXPRESS_KEYWORD if value.is_empty() => {
                return Err(ApiError::InvalidInput(format!("{} 不能为空", key)));
            }
            config_keys::UI_LOCALE if !i18n::is_supported(value) => {
                return Err(ApiError::InvalidInput(format!("不支持的语言: {}", value)));
            }
            _ => {}
        }

        self.config_manager.set_config_value(key, value)?;
        if key == config_keys::UI_LOCALE {
            i18n::set_locale(value);
        }
        info!(key = %key, value = %value, "配置已更新");

        self.list_configs()?
            .into_iter()
            .find(|item| item.key == key)
            .ok_or_else(|| ApiError::InternalError(format!("配置写入后未找到: {}", key)))
    }

    /// 当前界面语言
    pub fn get_locale(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_locale()?)
    }
}
