// ==========================================
// 订单管理系统 - 编码探测
// ==========================================
// 职责: 猜测上传内容的文本编码；解析编码标签
// 工具: chardetng（统计探测）+ encoding_rs（BOM / 标签 / 解码）
// ==========================================

use crate::importer::order_importer_trait::EncodingDetector;
use encoding_rs::Encoding;
use std::borrow::Cow;
use tracing::debug;

/// 探测时最多采样的字节数
const DETECT_SAMPLE_BYTES: usize = 64 * 1024;

pub struct ChardetEncodingDetector;

impl EncodingDetector for ChardetEncodingDetector {
    fn detect(&self, bytes: &[u8]) -> &'static Encoding {
        if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
            debug!(encoding = encoding.name(), "根据 BOM 判定编码");
            return encoding;
        }

        let sample = &bytes[..bytes.len().min(DETECT_SAMPLE_BYTES)];
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(sample, sample.len() == bytes.len());
        let encoding = detector.guess(None, true);
        debug!(encoding = encoding.name(), "编码探测完成");
        encoding
    }
}

/// 编码标签 → 编码（"latin1"、"cp1252" 等按 WHATWG 规则映射）
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// 严格解码：出现无法解码的字节时返回 None
pub fn decode_strict<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        None
    } else {
        Some(text)
    }
}
