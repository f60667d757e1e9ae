// ==========================================
// 订单管理系统 - 订单导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 事务: 整批一个事务；每个订单行一个 SAVEPOINT
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import::{ImportBatch, LineItemOutcome, PreparedLineItem};
use crate::repository::error::{is_unique_violation, RepositoryError, RepositoryResult};
use crate::repository::full_order_repo::FullOrderRepository;
use crate::repository::order_import_repo::OrderImportRepository;
use crate::repository::order_repo::OrderRepository;
use async_trait::async_trait;
use rusqlite::{params, Connection, Result as SqliteResult, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// ==========================================
// OrderImportRepositoryImpl
// ==========================================
pub struct OrderImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl OrderImportRepositoryImpl {
    /// 创建新的 Repository 实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在保存点内写入单个订单行
    fn insert_line_item_tx(tx: &mut Transaction, item: &PreparedLineItem) -> LineItemOutcome {
        let sp = match tx.savepoint() {
            Ok(sp) => sp,
            Err(e) => return LineItemOutcome::Failed(e.to_string()),
        };

        let written = FullOrderRepository::insert_with(&sp, &item.full)
            .and_then(|_| OrderRepository::insert_with(&sp, &item.order));

        match written {
            Ok(()) => match sp.commit() {
                Ok(()) => LineItemOutcome::Inserted,
                Err(e) => LineItemOutcome::Failed(e.to_string()),
            },
            // 保存点 drop 时回滚，两张表都不留痕
            Err(e) if is_unique_violation(&e) => {
                debug!(line_item_id = %item.line_item_id(), "订单行已存在，跳过");
                LineItemOutcome::Duplicate
            }
            Err(e) => {
                warn!(line_item_id = %item.line_item_id(), error = %e, "订单行写入失败");
                LineItemOutcome::Failed(e.to_string())
            }
        }
    }
}

fn map_batch_row(row: &rusqlite::Row<'_>) -> SqliteResult<ImportBatch> {
    Ok(ImportBatch {
        batch_id: row.get(0)?,
        file_name: row.get(1)?,
        encoding: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        delimiter: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        total_rows: row.get::<_, i64>(4)? as usize,
        valid_rows: row.get::<_, i64>(5)? as usize,
        skipped_rows: row.get::<_, i64>(6)? as usize,
        skipped_lines: row.get::<_, i64>(7)? as usize,
        imported: row.get::<_, i64>(8)? as usize,
        duplicated: row.get::<_, i64>(9)? as usize,
        errored: row.get::<_, i64>(10)? as usize,
        elapsed_ms: row.get(11)?,
        imported_at: row.get(12)?,
    })
}

#[async_trait]
impl OrderImportRepository for OrderImportRepositoryImpl {
    async fn insert_line_items(
        &self,
        items: Vec<PreparedLineItem>,
    ) -> RepositoryResult<Vec<LineItemOutcome>> {
        let conn = self.get_conn()?;
        let mut tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let outcomes = items
            .iter()
            .map(|item| Self::insert_line_item_tx(&mut tx, item))
            .collect::<Vec<_>>();

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(outcomes)
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, encoding, delimiter,
                total_rows, valid_rows, skipped_rows, skipped_lines,
                imported, duplicated, errored, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.encoding,
                batch.delimiter,
                batch.total_rows as i64,
                batch.valid_rows as i64,
                batch.skipped_rows as i64,
                batch.skipped_lines as i64,
                batch.imported as i64,
                batch.duplicated as i64,
                batch.errored as i64,
                batch.elapsed_ms,
            ],
        )?;
        Ok(())
    }

    async fn list_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, encoding, delimiter,
                   total_rows, valid_rows, skipped_rows, skipped_lines,
                   imported, duplicated, errored, elapsed_ms, imported_at
            FROM import_batch
            ORDER BY imported_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let batches = stmt
            .query_map(params![limit as i64], map_batch_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::import::ImportSummary;
    use crate::domain::order::{FullOrderRecord, OrderHeader, SimplifiedOrder};
    use crate::domain::types::{FreightType, Size};

    fn setup() -> (OrderImportRepositoryImpl, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (OrderImportRepositoryImpl::from_connection(shared.clone()), shared)
    }

    fn item(id: &str) -> PreparedLineItem {
        PreparedLineItem {
            full: FullOrderRecord {
                line_item_id: id.to_string(),
                order_number: id.split('_').next().unwrap().to_string(),
                header: OrderHeader::default(),
                product_name: "Blusa G".to_string(),
                product_value: 59.9,
                imported_at: None,
            },
            order: SimplifiedOrder::new(
                id.to_string(),
                "Ana".to_string(),
                "Blusa G".to_string(),
                Size::G,
                FreightType::Standard,
            ),
        }
    }

    fn count(shared: &Arc<Mutex<Connection>>, table: &str) -> i64 {
        let conn = shared.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reimport_counts_duplicates() {
        let (repo, shared) = setup();
        let first = repo
            .insert_line_items(vec![item("1001"), item("1001_2")])
            .await
            .unwrap();
        assert_eq!(first, vec![LineItemOutcome::Inserted, LineItemOutcome::Inserted]);

        let second = repo
            .insert_line_items(vec![item("1001"), item("1001_2")])
            .await
            .unwrap();
        assert_eq!(second, vec![LineItemOutcome::Duplicate, LineItemOutcome::Duplicate]);
        assert_eq!(count(&shared, "full_order"), 2);
        assert_eq!(count(&shared, "customer_order"), 2);
    }

    #[tokio::test]
    async fn test_simplified_conflict_rolls_back_full_record() {
        let (repo, shared) = setup();
        {
            // 只存在简化订单（例如手工录入）
            let conn = shared.lock().unwrap();
            OrderRepository::insert_with(&conn, &item("2001").order).unwrap();
        }

        let outcomes = repo.insert_line_items(vec![item("2001")]).await.unwrap();
        assert_eq!(outcomes, vec![LineItemOutcome::Duplicate]);
        assert_eq!(count(&shared, "full_order"), 0);
        assert_eq!(count(&shared, "customer_order"), 1);
    }

    #[tokio::test]
    async fn test_non_unique_failure_rolls_back_both_tables() {
        let (repo, shared) = setup();
        {
            // 非 UNIQUE 约束失败：full_order 已写入，customer_order 被触发器拒绝
            let conn = shared.lock().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_3002 BEFORE INSERT ON customer_order \
                 WHEN NEW.order_id = '3002' \
                 BEGIN SELECT RAISE(ABORT, 'pedido bloqueado'); END;",
            )
            .unwrap();
        }

        let outcomes = repo.insert_line_items(vec![item("3002")]).await.unwrap();
        assert!(matches!(outcomes[0], LineItemOutcome::Failed(ref msg) if msg.contains("pedido bloqueado")));
        assert_eq!(count(&shared, "full_order"), 0);
        assert_eq!(count(&shared, "customer_order"), 0);

        let mut summary = ImportSummary::default();
        outcomes.iter().for_each(|o| summary.record(o));
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.imported, 0);
        assert_eq!(summary.duplicated, 0);

        // 同一事务中的其他订单行不受影响
        let outcomes = repo
            .insert_line_items(vec![item("3001"), item("3002")])
            .await
            .unwrap();
        assert_eq!(outcomes[0], LineItemOutcome::Inserted);
        assert!(matches!(outcomes[1], LineItemOutcome::Failed(_)));
        assert_eq!(count(&shared, "full_order"), 1);
        assert_eq!(count(&shared, "customer_order"), 1);
    }

    #[tokio::test]
    async fn test_batch_log_round_trip() {
        let (repo, _shared) = setup();
        let batch = ImportBatch {
            batch_id: "b-1".to_string(),
            file_name: "pedidos.csv".to_string(),
            encoding: "UTF-8".to_string(),
            delimiter: ";".to_string(),
            total_rows: 3,
            valid_rows: 2,
            skipped_rows: 1,
            skipped_lines: 2,
            imported: 2,
            duplicated: 0,
            errored: 0,
            elapsed_ms: 12,
            imported_at: None,
        };
        repo.insert_batch(&batch).await.unwrap();

        let batches = repo.list_recent_batches(10).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].file_name, "pedidos.csv");
        assert_eq!(batches[0].skipped_rows, 1);
        assert_eq!(batches[0].skipped_lines, 2);
        assert!(batches[0].imported_at.is_some());
    }
}
