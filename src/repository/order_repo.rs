// ==========================================
// 订单管理系统 - 简化订单仓储
// ==========================================
// 职责: 管理 customer_order 表的 CRUD 操作
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{FullOrderRecord, OrderUpdate, OrderWithGroup, SimplifiedOrder};
use crate::domain::types::{FreightType, Size};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::full_order_repo::FullOrderRepository;
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str =
    "o.order_id, o.customer_name, o.product_name, o.size, o.freight_type, o.group_id, o.created_at";

/// 行 -> SimplifiedOrder（列顺序与 ORDER_COLUMNS 一致）
pub(crate) fn map_order_row(row: &Row<'_>) -> SqliteResult<SimplifiedOrder> {
    Ok(SimplifiedOrder {
        order_id: row.get(0)?,
        customer_name: row.get(1)?,
        product_name: row.get(2)?,
        size: Size::from_db_str(&row.get::<_, String>(3)?),
        freight_type: FreightType::from_db_str(&row.get::<_, String>(4)?),
        group_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_order_with_group_row(row: &Row<'_>) -> SqliteResult<OrderWithGroup> {
    Ok(OrderWithGroup {
        order: map_order_row(row)?,
        group_name: row.get(7)?,
        group_shipped: row.get::<_, Option<i64>>(8)?.map(|v| v != 0),
    })
}

/// 生成 "?1, ?2, ..." 占位符
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

// ==========================================
// OrderRepository - 简化订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在给定连接（事务/保存点）上插入简化订单
    pub(crate) fn insert_with(conn: &Connection, order: &SimplifiedOrder) -> SqliteResult<()> {
        conn.execute(
            r#"
            INSERT INTO customer_order (
                order_id, customer_name, product_name, size, freight_type, group_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                order.order_id,
                order.customer_name,
                order.product_name,
                order.size.as_str(),
                order.freight_type.to_db_str(),
                order.group_id,
            ],
        )?;
        Ok(())
    }

    /// 插入简化订单
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): order_id 已存在
    pub fn insert(&self, order: &SimplifiedOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, order)?;
        Ok(())
    }

    /// 同时写入简化订单与完整记录（手工录入，要么都成功要么都不写）
    pub fn insert_with_full_record(
        &self,
        order: &SimplifiedOrder,
        full: &FullOrderRecord,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        FullOrderRepository::insert_with(&tx, full)?;
        Self::insert_with(&tx, order)?;
        tx.commit()?;
        Ok(())
    }

    /// 按订单号查询（带分组信息）
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<OrderWithGroup>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}, g.name, g.shipped
            FROM customer_order o
            LEFT JOIN shipment_group g ON g.group_id = o.group_id
            WHERE o.order_id = ?1
            "#,
            ORDER_COLUMNS
        );

        let result = conn.query_row(&sql, params![order_id], map_order_with_group_row);
        match result {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部订单（带分组信息，最新在前）
    pub fn list_all_with_group(&self) -> RepositoryResult<Vec<OrderWithGroup>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}, g.name, g.shipped
            FROM customer_order o
            LEFT JOIN shipment_group g ON g.group_id = o.group_id
            ORDER BY o.created_at DESC, o.id DESC
            "#,
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map([], map_order_with_group_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 查询未分组订单（可选按运费类型过滤）
    pub fn list_ungrouped(
        &self,
        freight_type: Option<FreightType>,
    ) -> RepositoryResult<Vec<SimplifiedOrder>> {
        let conn = self.get_conn()?;
        let (sql, freight) = match freight_type {
            Some(ft) => (
                format!(
                    "SELECT {} FROM customer_order o WHERE o.group_id IS NULL AND o.freight_type = ?1 ORDER BY o.id",
                    ORDER_COLUMNS
                ),
                Some(ft.to_db_str()),
            ),
            None => (
                format!(
                    "SELECT {} FROM customer_order o WHERE o.group_id IS NULL ORDER BY o.id",
                    ORDER_COLUMNS
                ),
                None,
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let orders = match freight {
            Some(ft) => stmt
                .query_map(params![ft], map_order_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
            None => stmt
                .query_map([], map_order_row)?
                .collect::<SqliteResult<Vec<_>>>()?,
        };
        Ok(orders)
    }

    /// 按运费类型查询全部订单
    pub fn list_by_freight(&self, freight_type: FreightType) -> RepositoryResult<Vec<SimplifiedOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM customer_order o WHERE o.freight_type = ?1 ORDER BY o.id",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![freight_type.to_db_str()], map_order_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 查询分组成员
    pub fn list_by_group(&self, group_id: i64) -> RepositoryResult<Vec<SimplifiedOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM customer_order o WHERE o.group_id = ?1 ORDER BY o.id",
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![group_id], map_order_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    /// 更新订单可编辑字段
    ///
    /// 改为 EXPRESS 时要求订单未分组，判断与更新在同一条语句内完成
    ///
    /// # 返回
    /// - Ok(usize): 受影响行数（0 表示订单不存在，或已分组订单改为 EXPRESS）
    pub fn update(&self, order_id: &str, update: &OrderUpdate) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE customer_order
            SET customer_name = ?2, product_name = ?3, size = ?4, freight_type = ?5
            WHERE order_id = ?1
              AND (?5 <> 'EXPRESS' OR group_id IS NULL)
            "#,
            params![
                order_id,
                update.customer_name,
                update.product_name,
                update.size.as_str(),
                update.freight_type.to_db_str(),
            ],
        )?;
        Ok(affected)
    }

    /// 设置/清除订单所属分组
    pub fn set_group(&self, order_id: &str, group_id: Option<i64>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE customer_order SET group_id = ?2 WHERE order_id = ?1",
            params![order_id, group_id],
        )?;
        Ok(affected)
    }

    /// 批量移出分组
    pub fn detach_many(&self, order_ids: &[String]) -> RepositoryResult<usize> {
        if order_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let sql = format!(
            "UPDATE customer_order SET group_id = NULL WHERE order_id IN ({})",
            placeholders(order_ids.len())
        );
        let affected = conn.execute(&sql, params_from_iter(order_ids.iter()))?;
        Ok(affected)
    }

    /// 删除订单（简化订单 + 同标识的完整记录）
    ///
    /// # 返回
    /// - Ok(usize): 删除的简化订单数量
    pub fn delete_many(&self, order_ids: &[String]) -> RepositoryResult<usize> {
        if order_ids.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let marks = placeholders(order_ids.len());

        let deleted = tx.execute(
            &format!("DELETE FROM customer_order WHERE order_id IN ({})", marks),
            params_from_iter(order_ids.iter()),
        )?;
        tx.execute(
            &format!("DELETE FROM full_order WHERE line_item_id IN ({})", marks),
            params_from_iter(order_ids.iter()),
        )?;

        tx.commit()?;
        Ok(deleted)
    }

    /// 删除单个订单
    pub fn delete(&self, order_id: &str) -> RepositoryResult<usize> {
        self.delete_many(&[order_id.to_string()])
    }

    /// 订单总数 / 已分组数量
    pub fn count_totals(&self) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let (total, grouped): (i64, i64) = conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN group_id IS NOT NULL THEN 1 ELSE 0 END), 0)
            FROM customer_order
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total as usize, grouped as usize))
    }

    /// 清空全部业务数据（订单、分组、完整记录）
    pub fn clear_all(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM customer_order;
            DELETE FROM full_order;
            DELETE FROM shipment_group;
            "#,
        )?;
        tx.commit()?;
        Ok(())
    }
}
