// ==========================================
// 订单管理系统 - 完整订单记录仓储
// ==========================================
// 职责: 管理 full_order 表（每个订单行一条导入记录）
// 红线: line_item_id 唯一；冲突交由调用方按"已导入"处理
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{FullOrderRecord, OrderHeader};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const FULL_ORDER_COLUMNS: &str = r#"
    line_item_id, order_number,
    email, order_date, order_status, payment_status, shipment_status, currency,
    subtotal, discount, shipping_value, total,
    buyer_name, tax_id, phone,
    shipping_name, shipping_phone, address, number, complement, neighborhood,
    city, postal_code, state, country,
    delivery_method, payment_method, discount_coupon, buyer_notes, seller_notes,
    payment_date, shipping_date,
    product_name, product_value, imported_at
"#;

fn map_full_order_row(row: &Row<'_>) -> SqliteResult<FullOrderRecord> {
    // TEXT 列允许为 NULL（手工录入只写最小字段）
    let text = |idx: usize| -> SqliteResult<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };

    Ok(FullOrderRecord {
        line_item_id: row.get(0)?,
        order_number: row.get(1)?,
        header: OrderHeader {
            email: text(2)?,
            order_date: text(3)?,
            order_status: text(4)?,
            payment_status: text(5)?,
            shipment_status: text(6)?,
            currency: text(7)?,
            subtotal: row.get(8)?,
            discount: row.get(9)?,
            shipping_value: row.get(10)?,
            total: row.get(11)?,
            buyer_name: text(12)?,
            tax_id: text(13)?,
            phone: text(14)?,
            shipping_name: text(15)?,
            shipping_phone: text(16)?,
            address: text(17)?,
            number: text(18)?,
            complement: text(19)?,
            neighborhood: text(20)?,
            city: text(21)?,
            postal_code: text(22)?,
            state: text(23)?,
            country: text(24)?,
            delivery_method: text(25)?,
            payment_method: text(26)?,
            discount_coupon: text(27)?,
            buyer_notes: text(28)?,
            seller_notes: text(29)?,
            payment_date: text(30)?,
            shipping_date: text(31)?,
        },
        product_name: text(32)?,
        product_value: row.get(33)?,
        imported_at: row.get(34)?,
    })
}

// ==========================================
// FullOrderRepository - 完整订单记录仓储
// ==========================================
pub struct FullOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FullOrderRepository {
    /// 创建新的 FullOrderRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在给定连接（事务/保存点）上插入完整记录
    pub(crate) fn insert_with(conn: &Connection, record: &FullOrderRecord) -> SqliteResult<()> {
        let h = &record.header;
        conn.execute(
            r#"
            INSERT INTO full_order (
                line_item_id, order_number,
                email, order_date, order_status, payment_status, shipment_status, currency,
                subtotal, discount, shipping_value, total,
                buyer_name, tax_id, phone,
                shipping_name, shipping_phone, address, number, complement, neighborhood,
                city, postal_code, state, country,
                delivery_method, payment_method, discount_coupon, buyer_notes, seller_notes,
                payment_date, shipping_date,
                product_name, product_value
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32,
                ?33, ?34
            )
            "#,
            params![
                record.line_item_id,
                record.order_number,
                h.email,
                h.order_date,
                h.order_status,
                h.payment_status,
                h.shipment_status,
                h.currency,
                h.subtotal,
                h.discount,
                h.shipping_value,
                h.total,
                h.buyer_name,
                h.tax_id,
                h.phone,
                h.shipping_name,
                h.shipping_phone,
                h.address,
                h.number,
                h.complement,
                h.neighborhood,
                h.city,
                h.postal_code,
                h.state,
                h.country,
                h.delivery_method,
                h.payment_method,
                h.discount_coupon,
                h.buyer_notes,
                h.seller_notes,
                h.payment_date,
                h.shipping_date,
                record.product_name,
                record.product_value,
            ],
        )?;
        Ok(())
    }

    /// 按订单行标识查询
    pub fn find_by_line_item_id(
        &self,
        line_item_id: &str,
    ) -> RepositoryResult<Option<FullOrderRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM full_order WHERE line_item_id = ?1",
            FULL_ORDER_COLUMNS
        );
        let result = conn.query_row(&sql, params![line_item_id], map_full_order_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按原始订单号查询全部订单行
    pub fn list_by_order_number(&self, order_number: &str) -> RepositoryResult<Vec<FullOrderRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM full_order WHERE order_number = ?1 ORDER BY id",
            FULL_ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![order_number], map_full_order_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询导入记录（最新在前）
    ///
    /// # 参数
    /// - limit: 最大返回条数（None 表示全部）
    pub fn list_recent(&self, limit: Option<usize>) -> RepositoryResult<Vec<FullOrderRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM full_order ORDER BY imported_at DESC, id DESC LIMIT ?1",
            FULL_ORDER_COLUMNS
        );
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit], map_full_order_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 删除导入记录（完整记录 + 同标识的简化订单）
    ///
    /// # 返回
    /// - Ok(usize): 删除的完整记录数量
    pub fn delete(&self, line_item_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = tx.execute(
            "DELETE FROM full_order WHERE line_item_id = ?1",
            params![line_item_id],
        )?;
        tx.execute(
            "DELETE FROM customer_order WHERE order_id = ?1",
            params![line_item_id],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM full_order", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
