// ==========================================
// 订单管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// 配置键与默认值
// ==========================================
pub mod config_keys {
    // 导入 - 编码回退
    pub const IMPORT_FALLBACK_ENCODINGS: &str = "import.fallback_encodings"; // JSON 数组
    pub const IMPORT_LENIENT_ENCODINGS: &str = "import.lenient_encodings"; // JSON 数组

    // 导入 - 字段派生
    pub const IMPORT_EXPRESS_KEYWORD: &str = "import.express_keyword";

    // 界面
    pub const UI_LOCALE: &str = "ui.locale";

    /// 全部已知配置键
    pub const ALL: [&str; 4] = [
        IMPORT_FALLBACK_ENCODINGS,
        IMPORT_LENIENT_ENCODINGS,
        IMPORT_EXPRESS_KEYWORD,
        UI_LOCALE,
    ];
}

pub mod config_defaults {
    pub const FALLBACK_ENCODINGS: [&str; 5] =
        ["utf-8", "iso-8859-1", "windows-1252", "latin1", "cp1252"];
    pub const LENIENT_ENCODINGS: [&str; 3] = ["utf-8", "iso-8859-1", "windows-1252"];
    pub const EXPRESS_KEYWORD: &str = "express";
    pub const UI_LOCALE: &str = "pt-BR";
}

/// 配置项（列表展示用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: Option<String>,
}

/// 解析 JSON 字符串数组；格式错误或为空时返回 None
pub(crate) fn parse_string_list(raw: &str) -> Option<Vec<String>> {
    let list: Vec<String> = serde_json::from_str(raw).ok()?;
    let list: Vec<String> = list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

fn default_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 列出全部已存储配置
    pub fn list_config_entries(&self) -> RepositoryResult<Vec<ConfigEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value, updated_at FROM config_kv ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(ConfigEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 读取界面语言（未配置时为 pt-BR）
    pub fn get_locale(&self) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(config_keys::UI_LOCALE)?
            .unwrap_or_else(|| config_defaults::UI_LOCALE.to_string()))
    }

    /// 读取 JSON 数组配置，缺失或格式错误时回退默认值
    fn read_list(&self, key: &str, default: &[&str]) -> ImportResult<Vec<String>> {
        let raw = self
            .get_config_value(key)
            .map_err(|e| ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        match raw {
            None => Ok(default_list(default)),
            Some(raw) => match parse_string_list(&raw) {
                Some(list) => Ok(list),
                None => {
                    warn!(key = key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default_list(default))
                }
            },
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== 编码回退 =====

    async fn get_fallback_encodings(&self) -> ImportResult<Vec<String>> {
        self.read_list(
            config_keys::IMPORT_FALLBACK_ENCODINGS,
            &config_defaults::FALLBACK_ENCODINGS,
        )
    }

    async fn get_lenient_encodings(&self) -> ImportResult<Vec<String>> {
        self.read_list(
            config_keys::IMPORT_LENIENT_ENCODINGS,
            &config_defaults::LENIENT_ENCODINGS,
        )
    }

    // ===== 字段派生 =====

    async fn get_express_keyword(&self) -> ImportResult<String> {
        let value = self
            .get_config_value(config_keys::IMPORT_EXPRESS_KEYWORD)
            .map_err(|e| ImportError::ConfigReadError {
                key: config_keys::IMPORT_EXPRESS_KEYWORD.to_string(),
                message: e.to_string(),
            })?;

        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => Ok(v),
            Some(_) => {
                warn!("express_keyword 为空，使用默认值");
                Ok(config_defaults::EXPRESS_KEYWORD.to_string())
            }
            None => Ok(config_defaults::EXPRESS_KEYWORD.to_string()),
        }
    }
}
