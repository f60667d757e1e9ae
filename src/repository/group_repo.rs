// ==========================================
// 订单管理系统 - 发货分组仓储
// ==========================================
// 职责: 管理 shipment_group 表与成员关系
// 说明: assign_orders 在单个事务内完成容量检查与写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::group::{GroupWithCount, ShipmentGroup};
use crate::domain::types::FreightType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

fn map_group_row(row: &Row<'_>) -> SqliteResult<ShipmentGroup> {
    Ok(ShipmentGroup {
        group_id: row.get(0)?,
        name: row.get(1)?,
        tracking_code: row.get(2)?,
        shipped: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

fn count_members_with(conn: &Connection, group_id: i64) -> SqliteResult<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM customer_order WHERE group_id = ?1",
        params![group_id],
        |row| row.get(0),
    )?;
    Ok(n as usize)
}

/// 批量入组的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignOutcome {
    pub moved: Vec<String>,           // 已移入分组
    pub skipped_express: Vec<String>, // EXPRESS 订单，未移动
    pub missing: Vec<String>,         // 订单不存在
}

// ==========================================
// GroupRepository - 发货分组仓储
// ==========================================
pub struct GroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GroupRepository {
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

    /// 创建空分组
    ///
    /// # 返回
    /// - Ok(i64): 新分组 ID
    pub fn create(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO shipment_group (name) VALUES (?1)",
            params![name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, group_id: i64) -> RepositoryResult<Option<ShipmentGroup>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT group_id, name, tracking_code, shipped, created_at
            FROM shipment_group
            WHERE group_id = ?1
            "#,
            params![group_id],
            map_group_row,
        );
        match result {
            Ok(group) => Ok(Some(group)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部分组及成员数量（最新在前）
    pub fn list_with_counts(&self) -> RepositoryResult<Vec<GroupWithCount>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT g.group_id, g.name, g.tracking_code, g.shipped, g.created_at,
                   COUNT(o.id) AS order_count
            FROM shipment_group g
            LEFT JOIN customer_order o ON o.group_id = g.group_id
            GROUP BY g.group_id
            ORDER BY g.created_at DESC, g.group_id DESC
            "#,
        )?;
        let groups = stmt
            .query_map([], |row| {
                Ok(GroupWithCount {
                    group: map_group_row(row)?,
                    order_count: row.get::<_, i64>(5)? as usize,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(groups)
    }

    /// 分组成员数量
    pub fn count_members(&self, group_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(count_members_with(&conn, group_id)?)
    }

    /// 将订单移入分组（事务内检查容量）
    ///
    /// # 参数
    /// - group_id: 目标分组
    /// - order_ids: 选中的订单号
    /// - capacity: 分组容量上限
    ///
    /// # 返回
    /// - Err(NotFound): 分组不存在
    /// - Err(GroupFull): 当前成员数 + 选中数量 > capacity（整体拒绝，不做任何写入）
    /// - Ok(AssignOutcome): 只移动 STANDARD 订单
    pub fn assign_orders(
        &self,
        group_id: i64,
        order_ids: &[String],
        capacity: usize,
    ) -> RepositoryResult<AssignOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM shipment_group WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ShipmentGroup".to_string(),
                id: group_id.to_string(),
            });
        }

        let current = count_members_with(&tx, group_id)?;
        if current + order_ids.len() > capacity {
            debug!(group_id, current, selected = order_ids.len(), "分组容量不足");
            return Err(RepositoryError::GroupFull { group_id, capacity });
        }

        let mut outcome = AssignOutcome::default();
        for order_id in order_ids {
            let freight = tx.query_row(
                "SELECT freight_type FROM customer_order WHERE order_id = ?1",
                params![order_id],
                |row| row.get::<_, String>(0),
            );
            match freight {
                Ok(raw) if FreightType::from_db_str(&raw).is_groupable() => {
                    tx.execute(
                        "UPDATE customer_order SET group_id = ?2 WHERE order_id = ?1",
                        params![order_id, group_id],
                    )?;
                    outcome.moved.push(order_id.clone());
                }
                Ok(_) => outcome.skipped_express.push(order_id.clone()),
                Err(rusqlite::Error::QueryReturnedNoRows) => outcome.missing.push(order_id.clone()),
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// 标记已发货并写入物流单号
    pub fn mark_shipped(&self, group_id: i64, tracking_code: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE shipment_group SET shipped = 1, tracking_code = ?2 WHERE group_id = ?1",
            params![group_id, tracking_code],
        )?;
        Ok(affected)
    }

    /// 标记待发货（清除物流单号）
    pub fn mark_pending(&self, group_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE shipment_group SET shipped = 0, tracking_code = NULL WHERE group_id = ?1",
            params![group_id],
        )?;
        Ok(affected)
    }

    /// 修改物流单号（None 表示清空）
    pub fn update_tracking_code(
        &self,
        group_id: i64,
        tracking_code: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE shipment_group SET tracking_code = ?2 WHERE group_id = ?1",
            params![group_id, tracking_code],
        )?;
        Ok(affected)
    }

    /// 删除分组（成员订单解除关联，不删除）
    pub fn delete(&self, group_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE customer_order SET group_id = NULL WHERE group_id = ?1",
            params![group_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM shipment_group WHERE group_id = ?1",
            params![group_id],
        )?;
        tx.commit()?;
        Ok(deleted)
    }

    /// 分组总数 / 已发货数量
    pub fn count_totals(&self) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let (total, shipped): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(shipped), 0) FROM shipment_group",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((total as usize, shipped as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::order::SimplifiedOrder;
    use crate::domain::types::Size;
    use crate::repository::order_repo::OrderRepository;

    fn setup() -> (GroupRepository, OrderRepository) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (
            GroupRepository::from_connection(shared.clone()),
            OrderRepository::from_connection(shared),
        )
    }

    fn add_order(repo: &OrderRepository, id: &str, freight: FreightType) {
        repo.insert(&SimplifiedOrder::new(
            id.to_string(),
            "Cliente".to_string(),
            "Camiseta M".to_string(),
            Size::M,
            freight,
        ))
        .unwrap();
    }

    #[test]
    fn test_assign_skips_express_orders() {
        let (groups, orders) = setup();
        add_order(&orders, "PED001", FreightType::Standard);
        add_order(&orders, "PED002", FreightType::Express);
        let gid = groups.create("Grupo 1").unwrap();

        let outcome = groups
            .assign_orders(gid, &["PED001".to_string(), "PED002".to_string()], 5)
            .unwrap();
        assert_eq!(outcome.moved, vec!["PED001".to_string()]);
        assert_eq!(outcome.skipped_express, vec!["PED002".to_string()]);
        assert_eq!(groups.count_members(gid).unwrap(), 1);
    }

    #[test]
    fn test_assign_rejected_when_over_capacity() {
        let (groups, orders) = setup();
        let gid = groups.create("Grupo 1").unwrap();
        let ids: Vec<String> = (1..=6).map(|i| format!("PED00{}", i)).collect();
        for id in &ids {
            add_order(&orders, id, FreightType::Standard);
        }

        groups.assign_orders(gid, &ids[..5], 5).unwrap();
        let err = groups.assign_orders(gid, &ids[5..], 5).unwrap_err();
        assert!(matches!(err, RepositoryError::GroupFull { capacity: 5, .. }));
        assert_eq!(groups.count_members(gid).unwrap(), 5);
    }

    #[test]
    fn test_assign_unknown_group() {
        let (groups, _orders) = setup();
        let err = groups.assign_orders(42, &[], 5).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_ship_unship_and_delete() {
        let (groups, orders) = setup();
        add_order(&orders, "PED001", FreightType::Standard);
        let gid = groups.create("Grupo 1").unwrap();
        groups.assign_orders(gid, &["PED001".to_string()], 5).unwrap();

        groups.mark_shipped(gid, "BR123456789").unwrap();
        let g = groups.find_by_id(gid).unwrap().unwrap();
        assert!(g.shipped);
        assert_eq!(g.tracking_code.as_deref(), Some("BR123456789"));

        groups.mark_pending(gid).unwrap();
        let g = groups.find_by_id(gid).unwrap().unwrap();
        assert!(!g.shipped);
        assert_eq!(g.tracking_code, None);

        assert_eq!(groups.delete(gid).unwrap(), 1);
        let order = orders.find_by_id("PED001").unwrap().unwrap();
        assert_eq!(order.order.group_id, None);
    }
}
