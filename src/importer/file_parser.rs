// ==========================================
// 订单管理系统 - 表格解析器实现
// ==========================================
// 职责: 字节 → 表格；按尝试计划（编码 × 分隔符 × 解析模式）依次解析
// 规则:
// - 首个成功的尝试胜出
// - 结构错误的单行跳过，不中断整个解析
// - 全部尝试失败 => FileUnreadable
// ==========================================

use crate::domain::import::{ParsedTable, RawRow};
use crate::importer::encoding::{decode_strict, encoding_for_label};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::FileParser;
use csv::ReaderBuilder;
use encoding_rs::Encoding;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// 跳过行时最多记录的日志条数
const MAX_LOGGED_SKIPS: usize = 5;

// ==========================================
// ParseMode / ParseAttempt - 单次解析尝试
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseMode {
    /// 识别引号；字段多于表头的行视为坏行并跳过
    Strict,
    /// 不识别引号；多余字段截断，缺少字段补空
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAttempt {
    pub encoding: &'static Encoding,
    pub delimiter: u8,
    pub mode: ParseMode,
}

impl ParseAttempt {
    pub fn new(encoding: &'static Encoding, delimiter: u8, mode: ParseMode) -> Self {
        Self {
            encoding,
            delimiter,
            mode,
        }
    }

    /// 构建尝试计划
    ///
    /// # 顺序
    /// 1. 探测编码 + 逗号
    /// 2. 探测编码 + 分号
    /// 3. 回退编码列表 + 逗号
    /// 4. 宽松编码列表 + 逗号（宽松模式）
    /// 5. 宽松编码列表 + 分号
    ///
    /// # 说明
    /// - 无法识别的编码标签跳过
    /// - 完全相同的尝试只保留第一次
    pub fn plan(
        detected: &'static Encoding,
        fallback_encodings: &[String],
        lenient_encodings: &[String],
    ) -> Vec<ParseAttempt> {
        let fallback = resolve_labels(fallback_encodings);
        let lenient = resolve_labels(lenient_encodings);

        let mut attempts = vec![
            ParseAttempt::new(detected, b',', ParseMode::Strict),
            ParseAttempt::new(detected, b';', ParseMode::Strict),
        ];
        attempts.extend(
            fallback
                .iter()
                .map(|enc| ParseAttempt::new(enc, b',', ParseMode::Strict)),
        );
        attempts.extend(
            lenient
                .iter()
                .map(|enc| ParseAttempt::new(enc, b',', ParseMode::Lenient)),
        );
        attempts.extend(
            lenient
                .iter()
                .map(|enc| ParseAttempt::new(enc, b';', ParseMode::Strict)),
        );

        let mut seen = HashSet::new();
        attempts.retain(|a| seen.insert((a.encoding.name(), a.delimiter, a.mode)));
        attempts
    }
}

fn resolve_labels(labels: &[String]) -> Vec<&'static Encoding> {
    labels
        .iter()
        .filter_map(|label| {
            let enc = encoding_for_label(label);
            if enc.is_none() {
                warn!(label = %label, "未知编码标签，已忽略");
            }
            enc
        })
        .collect()
}

/// 单次尝试的结果
#[derive(Debug)]
pub enum AttemptOutcome {
    Parsed(ParsedTable),
    /// 可恢复：继续下一次尝试
    Recoverable(String),
    /// 不可恢复：终止解析
    Fatal(ImportError),
}

// ==========================================
// CsvFallbackParser - CSV 回退链解析器
// ==========================================
pub struct CsvFallbackParser;

impl CsvFallbackParser {
    /// 执行单次解析尝试
    pub fn try_attempt(&self, bytes: &[u8], attempt: &ParseAttempt) -> AttemptOutcome {
        let text = match decode_strict(attempt.encoding, bytes) {
            Some(text) => text,
            None => {
                return AttemptOutcome::Recoverable(format!(
                    "无法以 {} 解码",
                    attempt.encoding.name()
                ))
            }
        };

        if text.trim().is_empty() {
            return AttemptOutcome::Fatal(ImportError::EmptyFile);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(attempt.delimiter)
            .quoting(attempt.mode == ParseMode::Strict)
            .from_reader(text.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut rows: Vec<RawRow> = Vec::new();
        let mut skipped_lines = 0usize;

        for (line_idx, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => return AttemptOutcome::Recoverable(e.to_string()),
            };

            let fields: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            // 跳过完全空白的行
            if fields.iter().all(|v| v.is_empty()) {
                continue;
            }

            // 第一条非空记录为表头
            if headers.is_none() {
                headers = Some(build_headers(&fields));
                continue;
            }
            let header = match headers.as_ref() {
                Some(h) => h,
                None => continue,
            };

            if fields.len() > header.len() && attempt.mode == ParseMode::Strict {
                skipped_lines += 1;
                if skipped_lines <= MAX_LOGGED_SKIPS {
                    debug!(
                        line = line_idx + 1,
                        expected = header.len(),
                        actual = fields.len(),
                        "字段数超过表头，跳过该行"
                    );
                }
                continue;
            }

            let mut row = RawRow::with_capacity(header.len());
            for (col_idx, name) in header.iter().enumerate() {
                let value = fields.get(col_idx).cloned().unwrap_or_default();
                row.insert(name.clone(), value);
            }
            rows.push(row);
        }

        let headers = match headers {
            Some(h) if h.iter().any(|name| !is_placeholder(name)) => h,
            _ => return AttemptOutcome::Recoverable("缺少表头".to_string()),
        };

        // 单列表头却有超宽行：分隔符猜错（整行读成一列，只有含逗号的行被拆开）
        if attempt.mode == ParseMode::Strict && headers.len() == 1 && skipped_lines > 0 {
            return AttemptOutcome::Recoverable(format!(
                "单列表头出现超宽行: skipped={}",
                skipped_lines
            ));
        }

        // 坏行多于正常行：分隔符很可能猜错
        if skipped_lines > rows.len() {
            return AttemptOutcome::Recoverable(format!(
                "坏行过多: skipped={}, parsed={}",
                skipped_lines,
                rows.len()
            ));
        }

        AttemptOutcome::Parsed(ParsedTable {
            headers,
            rows,
            encoding: attempt.encoding.name().to_string(),
            delimiter: attempt.delimiter as char,
            skipped_lines,
        })
    }
}

impl FileParser for CsvFallbackParser {
    fn parse(&self, bytes: &[u8], attempts: &[ParseAttempt]) -> ImportResult<ParsedTable> {
        if bytes.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        for (idx, attempt) in attempts.iter().enumerate() {
            match self.try_attempt(bytes, attempt) {
                AttemptOutcome::Parsed(table) => {
                    info!(
                        attempt = idx + 1,
                        encoding = %table.encoding,
                        delimiter = %table.delimiter,
                        columns = table.column_count(),
                        rows = table.row_count(),
                        skipped_lines = table.skipped_lines,
                        "CSV 解析成功"
                    );
                    return Ok(table);
                }
                AttemptOutcome::Recoverable(reason) => {
                    debug!(
                        attempt = idx + 1,
                        encoding = attempt.encoding.name(),
                        delimiter = %(attempt.delimiter as char),
                        mode = ?attempt.mode,
                        reason = %reason,
                        "解析尝试失败，继续下一种组合"
                    );
                }
                AttemptOutcome::Fatal(err) => return Err(err),
            }
        }

        warn!(attempts = attempts.len(), "全部解析尝试均失败");
        Err(ImportError::FileUnreadable {
            attempts: attempts.len(),
        })
    }
}

/// 占位列名（表头单元格为空时生成）
fn placeholder_name(idx: usize) -> String {
    format!("Column_{}", idx)
}

fn is_placeholder(name: &str) -> bool {
    name.strip_prefix("Column_")
        .map(|rest| rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// 表头清洗：去除 BOM/空白，空列名补占位名，重复列名追加 .N
fn build_headers(fields: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    fields
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let name = raw.trim_start_matches('\u{feff}').trim().to_string();
            let base = if name.is_empty() {
                placeholder_name(idx)
            } else {
                name
            };

            let mut candidate = base.clone();
            let mut n = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_plan(detected: &'static Encoding) -> Vec<ParseAttempt> {
        let fallback: Vec<String> = ["utf-8", "iso-8859-1", "windows-1252", "latin1", "cp1252"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let lenient: Vec<String> = ["utf-8", "iso-8859-1", "windows-1252"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        ParseAttempt::plan(detected, &fallback, &lenient)
    }

    #[test]
    fn test_plan_order_and_dedup() {
        let plan = default_plan(encoding_rs::UTF_8);
        assert_eq!(plan[0], ParseAttempt::new(encoding_rs::UTF_8, b',', ParseMode::Strict));
        assert_eq!(plan[1], ParseAttempt::new(encoding_rs::UTF_8, b';', ParseMode::Strict));
        // 回退列表中 utf-8 与探测结果重复、latin1/cp1252/iso-8859-1 均为 windows-1252
        assert_eq!(
            plan[2],
            ParseAttempt::new(encoding_rs::WINDOWS_1252, b',', ParseMode::Strict)
        );
        assert_eq!(plan[3].mode, ParseMode::Lenient);
        assert_eq!(plan.len(), 6);
        assert_eq!(
            plan[5],
            ParseAttempt::new(encoding_rs::WINDOWS_1252, b';', ParseMode::Strict)
        );
    }

    #[test]
    fn test_parse_comma_file() {
        let csv = "Order Number,Buyer Name\n1001,Ana\n1002,Bruno\n";
        let table = CsvFallbackParser
            .parse(csv.as_bytes(), &default_plan(encoding_rs::UTF_8))
            .unwrap();
        assert_eq!(table.headers, vec!["Order Number", "Buyer Name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["Buyer Name"], "Bruno");
        assert_eq!(table.delimiter, ',');
    }

    #[test]
    fn test_falls_back_to_semicolon_when_commas_break_rows() {
        // 逗号解析时表头只有 1 列，而数据行因小数逗号被拆开 => 坏行过多
        let csv = "Order Number;Total\n1001;129,90\n1002;59,90\n";
        let table = CsvFallbackParser
            .parse(csv.as_bytes(), &default_plan(encoding_rs::UTF_8))
            .unwrap();
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.headers, vec!["Order Number", "Total"]);
        assert_eq!(table.rows[0]["Total"], "129,90");
    }

    #[test]
    fn test_single_comma_row_in_semicolon_file_falls_back() {
        // 只有一行含逗号：坏行数不多于正常行，仍须改用分号
        let csv = "Order Number;Product Name\n1001;Camiseta GG\n1002;Camiseta, Azul GG\n1003;Boné\n";
        let table = CsvFallbackParser
            .parse(csv.as_bytes(), &default_plan(encoding_rs::UTF_8))
            .unwrap();
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.skipped_lines, 0);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1]["Product Name"], "Camiseta, Azul GG");
    }

    #[test]
    fn test_latin1_bytes_fall_back() {
        let bytes = b"Order Number,City\n1001,S\xE3o Paulo\n";
        let table = CsvFallbackParser
            .parse(bytes, &default_plan(encoding_rs::UTF_8))
            .unwrap();
        assert_eq!(table.encoding, "windows-1252");
        assert_eq!(table.rows[0]["City"], "São Paulo");
    }

    #[test]
    fn test_bad_line_skipped_short_line_padded() {
        let csv = "A,B\n1,2\n1,2,3\n4\n5,6\n";
        let outcome = CsvFallbackParser.try_attempt(
            csv.as_bytes(),
            &ParseAttempt::new(encoding_rs::UTF_8, b',', ParseMode::Strict),
        );
        match outcome {
            AttemptOutcome::Parsed(table) => {
                assert_eq!(table.rows.len(), 3);
                assert_eq!(table.skipped_lines, 1);
                assert_eq!(table.rows[1]["B"], "");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_lenient_mode_truncates() {
        let csv = "A,B\n\"x,1,2\n";
        let outcome = CsvFallbackParser.try_attempt(
            csv.as_bytes(),
            &ParseAttempt::new(encoding_rs::UTF_8, b',', ParseMode::Lenient),
        );
        match outcome {
            AttemptOutcome::Parsed(table) => {
                assert_eq!(table.rows.len(), 1);
                assert_eq!(table.rows[0]["A"], "\"x");
                assert_eq!(table.rows[0]["B"], "1");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_empty_file() {
        let err = CsvFallbackParser
            .parse(b"", &default_plan(encoding_rs::UTF_8))
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile));

        let err = CsvFallbackParser
            .parse(b"\n\n  \n", &default_plan(encoding_rs::UTF_8))
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyFile));
    }

    #[test]
    fn test_unreadable_when_every_attempt_fails() {
        // 仅 UTF-8 尝试，内容不是合法 UTF-8
        let plan = vec![
            ParseAttempt::new(encoding_rs::UTF_8, b',', ParseMode::Strict),
            ParseAttempt::new(encoding_rs::UTF_8, b';', ParseMode::Strict),
        ];
        let err = CsvFallbackParser.parse(b"A,B\n\xFF\xFE\xFD,1\n", &plan).unwrap_err();
        assert!(matches!(err, ImportError::FileUnreadable { attempts: 2 }));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let headers = build_headers(&[
            "\u{feff}SKU".to_string(),
            "".to_string(),
            "SKU".to_string(),
        ]);
        assert_eq!(headers, vec!["SKU", "Column_1", "SKU.1"]);
    }
}
