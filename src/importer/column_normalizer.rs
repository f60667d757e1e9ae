// ==========================================
// 订单管理系统 - 列规范化
// ==========================================
// 职责:
// - 单列表格（分隔符猜错）按分号重新拆分
// - 拆分后列数 >= 33 时按位置赋予标准列名
// - 葡萄牙语导出表头映射为标准列名
// - 校验必需列
// ==========================================

use crate::domain::import::{ParsedTable, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::ColumnNormalizer;
use std::collections::HashMap;
use tracing::{debug, info, warn};

// ==========================================
// 列目录
// ==========================================

/// 标准列名（按导出文件的列顺序）；前 33 列为必需列
pub const CANONICAL_COLUMNS: [&str; 45] = [
    "Order Number",
    "Email",
    "Date",
    "Order Status",
    "Payment Status",
    "Shipment Status",
    "Currency",
    "Subtotal",
    "Discount",
    "Shipping Value",
    "Total",
    "Buyer Name",
    "Tax ID",
    "Phone",
    "Shipping Name",
    "Shipping Phone",
    "Address",
    "Number",
    "Complement",
    "Neighborhood",
    "City",
    "Postal Code",
    "State",
    "Country",
    "Delivery Method",
    "Payment Method",
    "Discount Coupon",
    "Buyer Notes",
    "Seller Notes",
    "Payment Date",
    "Shipping Date",
    "Product Name",
    "Product Value",
    // ===== 可选列 =====
    "Quantity",
    "SKU",
    "Channel",
    "Shipment Tracking Code",
    "Payment Transaction ID",
    "Order Identifier",
    "Physical Product",
    "Registered By",
    "Point of Sale",
    "Seller",
    "Cancellation Date",
    "Cancellation Reason",
];

/// 葡萄牙语导出表头（与 CANONICAL_COLUMNS 一一对应）
pub const PORTUGUESE_HEADERS: [&str; 45] = [
    "Número do Pedido",
    "E-mail",
    "Data",
    "Status do Pedido",
    "Status do Pagamento",
    "Status do Envio",
    "Moeda",
    "Subtotal",
    "Desconto",
    "Valor do Frete",
    "Total",
    "Nome do comprador",
    "CPF / CNPJ",
    "Telefone",
    "Nome para a entrega",
    "Telefone para a entrega",
    "Endereço",
    "Número",
    "Complemento",
    "Bairro",
    "Cidade",
    "Código postal",
    "Estado",
    "País",
    "Forma de Entrega",
    "Forma de Pagamento",
    "Cupom de Desconto",
    "Anotações do Comprador",
    "Anotações do Vendedor",
    "Data de pagamento",
    "Data de envío",
    "Nome do Produto",
    "Valor do Produto",
    "Quantidade Comprada",
    "SKU",
    "Canal",
    "Código de rastreio do envio",
    "Identificador da transação no meio de pagamento",
    "Identificador do pedido",
    "Produto Fisico",
    "Pessoa que registrou a venda",
    "Local de venda",
    "Vendedor",
    "Data e hora do cancelamento",
    "Motivo do cancelamento",
];

/// 必需列数量
pub const REQUIRED_COLUMN_COUNT: usize = 33;

/// 单列拆分后可按位置命名的最少列数
pub const MIN_SPLIT_COLUMNS: usize = REQUIRED_COLUMN_COUNT;

/// 必需列
pub fn required_columns() -> &'static [&'static str] {
    &CANONICAL_COLUMNS[..REQUIRED_COLUMN_COUNT]
}

/// 超出标准列数的占位列名
fn extra_column_name(idx: usize) -> String {
    format!("Column_{}", idx)
}

/// 列名比较键：去空白、小写
fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

/// 拆分单元格并去除包裹的引号
fn split_cell(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(|part| part.trim().trim_matches('"').trim().to_string())
        .collect()
}

// ==========================================
// ColumnNormalizerImpl
// ==========================================
pub struct ColumnNormalizerImpl {
    // 比较键 -> 标准列名
    aliases: HashMap<String, &'static str>,
}

impl Default for ColumnNormalizerImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnNormalizerImpl {
    pub fn new() -> Self {
        let mut aliases = HashMap::new();
        for (canonical, portuguese) in CANONICAL_COLUMNS.iter().zip(PORTUGUESE_HEADERS.iter()) {
            aliases.insert(fold(canonical), *canonical);
            aliases.insert(fold(portuguese), *canonical);
        }
        Self { aliases }
    }

    /// 单列表格按分号拆分；列数不足时原样返回
    pub fn split_single_column(&self, table: ParsedTable) -> ParsedTable {
        let source = match table.headers.first() {
            Some(h) => h.clone(),
            None => return table,
        };

        let split_rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| split_cell(row.get(&source).map(String::as_str).unwrap_or("")))
            .collect();

        let width = split_rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or_else(|| split_cell(&source).len());

        if width < MIN_SPLIT_COLUMNS {
            debug!(width, "单列拆分后列数不足，保持原表");
            return table;
        }

        let headers: Vec<String> = (0..width)
            .map(|idx| match CANONICAL_COLUMNS.get(idx) {
                Some(name) => name.to_string(),
                None => extra_column_name(idx),
            })
            .collect();

        let rows = split_rows
            .into_iter()
            .map(|values| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| (name.clone(), values.get(idx).cloned().unwrap_or_default()))
                    .collect::<RawRow>()
            })
            .collect();

        info!(width, "单列表格已按分号拆分");
        ParsedTable {
            headers,
            rows,
            ..table
        }
    }

    /// 将别名表头重命名为标准列名（目标列已存在时保留原名）
    pub fn canonicalize_headers(&self, table: ParsedTable) -> ParsedTable {
        let mut renames: HashMap<String, String> = HashMap::new();
        let mut taken: Vec<String> = table.headers.clone();

        for header in &table.headers {
            if let Some(canonical) = self.aliases.get(&fold(header)) {
                if header != canonical && !taken.iter().any(|h| h == canonical) {
                    renames.insert(header.clone(), canonical.to_string());
                    taken.push(canonical.to_string());
                }
            }
        }

        if renames.is_empty() {
            return table;
        }
        debug!(renamed = renames.len(), "表头别名已映射为标准列名");

        let rename = |name: &String| renames.get(name).cloned().unwrap_or_else(|| name.clone());
        let headers = table.headers.iter().map(rename).collect();
        let rows = table
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (rename(&k), v)).collect())
            .collect();

        ParsedTable {
            headers,
            rows,
            ..table
        }
    }

    /// 必需列校验
    pub fn check_required(&self, headers: &[String]) -> ImportResult<()> {
        let missing: Vec<String> = required_columns()
            .iter()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .map(|col| col.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            warn!(missing = ?missing, "缺少必需列");
            Err(ImportError::MissingColumns(missing))
        }
    }
}

impl ColumnNormalizer for ColumnNormalizerImpl {
    fn normalize(&self, table: ParsedTable) -> ImportResult<ParsedTable> {
        let table = if table.column_count() == 1 {
            self.split_single_column(table)
        } else {
            table
        };
        let table = self.canonicalize_headers(table);
        self.check_required(&table.headers)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_column_table(lines: &[String]) -> ParsedTable {
        let header = "Número do Pedido;E-mail;...".to_string();
        ParsedTable {
            headers: vec![header.clone()],
            rows: lines
                .iter()
                .map(|l| {
                    let mut row = RawRow::new();
                    row.insert(header.clone(), l.clone());
                    row
                })
                .collect(),
            encoding: "UTF-8".to_string(),
            delimiter: ',',
            skipped_lines: 0,
        }
    }

    fn line_with(width: usize, first: &str) -> String {
        let mut values = vec![first.to_string()];
        values.extend((1..width).map(|i| format!("\"v{}\"", i)));
        values.join(";")
    }

    #[test]
    fn test_split_45_columns_positional_names() {
        let n = ColumnNormalizerImpl::new();
        let table = n
            .normalize(single_column_table(&[line_with(45, "1001")]))
            .unwrap();
        assert_eq!(table.column_count(), 45);
        assert_eq!(table.headers[0], "Order Number");
        assert_eq!(table.headers[44], "Cancellation Reason");
        assert_eq!(table.rows[0]["Order Number"], "1001");
        assert_eq!(table.rows[0]["Email"], "v1");
    }

    #[test]
    fn test_split_extra_columns_get_placeholders() {
        let n = ColumnNormalizerImpl::new();
        let table = n
            .normalize(single_column_table(&[line_with(47, "1001")]))
            .unwrap();
        assert_eq!(table.headers[45], "Column_45");
        assert_eq!(table.headers[46], "Column_46");
    }

    #[test]
    fn test_split_33_columns_is_enough() {
        let n = ColumnNormalizerImpl::new();
        let table = n
            .normalize(single_column_table(&[line_with(33, "1001")]))
            .unwrap();
        assert_eq!(table.headers.last().map(String::as_str), Some("Product Value"));
    }

    #[test]
    fn test_too_few_split_columns_fail_required_check() {
        let n = ColumnNormalizerImpl::new();
        let err = n
            .normalize(single_column_table(&[line_with(10, "1001")]))
            .unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => {
                assert_eq!(cols.len(), 33);
                assert_eq!(cols[0], "Order Number");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_portuguese_headers_are_canonicalized() {
        let n = ColumnNormalizerImpl::new();
        let headers: Vec<String> = PORTUGUESE_HEADERS.iter().map(|s| s.to_string()).collect();
        let mut row = RawRow::new();
        row.insert("Número do Pedido".to_string(), "1001".to_string());
        row.insert("Forma de Entrega".to_string(), "Sedex Expresso".to_string());
        let table = ParsedTable {
            headers,
            rows: vec![row],
            ..Default::default()
        };

        let table = n.normalize(table).unwrap();
        assert_eq!(table.headers[0], "Order Number");
        assert_eq!(table.rows[0]["Order Number"], "1001");
        assert_eq!(table.rows[0]["Delivery Method"], "Sedex Expresso");
    }

    #[test]
    fn test_missing_columns_named() {
        let n = ColumnNormalizerImpl::new();
        let headers: Vec<String> = required_columns()
            .iter()
            .filter(|c| **c != "Email" && **c != "Total")
            .map(|s| s.to_string())
            .collect();
        let err = n.check_required(&headers).unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => assert_eq!(cols, vec!["Email", "Total"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
