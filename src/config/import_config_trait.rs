// ==========================================
// 订单管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 编码回退 =====

    /// 严格模式下依次尝试的编码列表
    ///
    /// # 默认值
    /// - ["utf-8", "iso-8859-1", "windows-1252", "latin1", "cp1252"]
    async fn get_fallback_encodings(&self) -> ImportResult<Vec<String>>;

    /// 宽松模式（含分号回退）下尝试的编码列表
    ///
    /// # 默认值
    /// - ["utf-8", "iso-8859-1", "windows-1252"]
    async fn get_lenient_encodings(&self) -> ImportResult<Vec<String>>;

    // ===== 字段派生 =====

    /// 判定 EXPRESS 运费的关键字（大小写不敏感的子串匹配）
    ///
    /// # 默认值
    /// - "express"
    async fn get_express_keyword(&self) -> ImportResult<String>;
}
