// ==========================================
// 订单管理系统 - 领域类型定义
// ==========================================
// 依据: 数据模型 - SimplifiedOrder 派生字段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 运费类型 (Freight Type)
// ==========================================
// 红线: 只有 STANDARD 订单可以加入发货分组
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreightType {
    Standard, // 普通运费（可分组）
    Express,  // 加急（单独发货）
}

impl FreightType {
    /// 转换为数据库存储字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            FreightType::Standard => "STANDARD",
            FreightType::Express => "EXPRESS",
        }
    }

    /// 从数据库字符串解析（未知值按 STANDARD 处理）
    pub fn from_db_str(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "EXPRESS" => FreightType::Express,
            _ => FreightType::Standard,
        }
    }

    /// 是否允许加入发货分组
    pub fn is_groupable(&self) -> bool {
        matches!(self, FreightType::Standard)
    }
}

impl fmt::Display for FreightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 尺码 (Size)
// ==========================================
// 从商品名称中识别，识别失败时默认 M
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size {
    PP,
    P,
    M,
    G,
    GG,
    XG,
    XXG,
}

impl Size {
    /// 已知尺码（按扫描顺序）
    pub const ALL: [Size; 7] = [
        Size::PP,
        Size::P,
        Size::M,
        Size::G,
        Size::GG,
        Size::XG,
        Size::XXG,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::PP => "PP",
            Size::P => "P",
            Size::M => "M",
            Size::G => "G",
            Size::GG => "GG",
            Size::XG => "XG",
            Size::XXG => "XXG",
        }
    }

    /// 精确匹配尺码标记（大小写不敏感）
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.trim().to_uppercase();
        Size::ALL.iter().copied().find(|s| s.as_str() == upper)
    }

    /// 从数据库字符串解析（未知值按默认尺码处理）
    pub fn from_db_str(value: &str) -> Self {
        Self::from_token(value).unwrap_or_default()
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::M
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
