// ==========================================
// 订单管理系统 - 字段派生服务实现
// ==========================================
// 职责: freight_type / size / line_item_id 派生
// ==========================================

use crate::domain::types::{FreightType, Size};
use crate::importer::order_importer_trait::DerivationService as DerivationServiceTrait;

pub struct DerivationService;

impl DerivationServiceTrait for DerivationService {
    /// 派生运费类型
    ///
    /// # 规则
    /// - 配送方式包含关键字（大小写不敏感）→ EXPRESS
    /// - 其他 → STANDARD
    fn derive_freight_type(&self, delivery_method: &str, express_keyword: &str) -> FreightType {
        let keyword = express_keyword.trim().to_lowercase();
        if !keyword.is_empty() && delivery_method.to_lowercase().contains(&keyword) {
            FreightType::Express
        } else {
            FreightType::Standard
        }
    }

    /// 派生尺码
    ///
    /// # 规则
    /// - 商品名称按非字母数字字符切词
    /// - 从最后一个词向前扫描，第一个等于已知尺码的词胜出
    /// - 未识别 → M
    fn derive_size(&self, product_name: &str) -> Size {
        product_name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .rev()
            .find_map(Size::from_token)
            .unwrap_or_default()
    }

    /// 派生订单行标识
    ///
    /// # 示例
    /// - ("1001", 0) → "1001"
    /// - ("1001", 1) → "1001_2"
    fn derive_line_item_id(&self, order_number: &str, index: usize) -> String {
        if index == 0 {
            order_number.to_string()
        } else {
            format!("{}_{}", order_number, index + 1)
        }
    }
}
