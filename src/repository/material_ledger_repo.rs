// ==========================================
// 工序执行质量追踪系统 - 物料台账数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 台账只增不删；每次更新为单条 UPSERT，按物料ID原子生效
// ==========================================

use crate::domain::material::{MaterialLedgerEntry, NamedLedgerEntry};
use crate::engine::execution::MaterialLedger;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteMaterialLedger - 事务内台账写入
// ==========================================
// 借用调用方的连接/事务，提交由调用方负责
pub struct SqliteMaterialLedger<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteMaterialLedger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl MaterialLedger for SqliteMaterialLedger<'_> {
    fn ensure(&self, material_id: i64) -> RepositoryResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO material_ledger (material_id) VALUES (?1)",
            params![material_id],
        )?;
        Ok(())
    }

    fn record_receipt(&self, material_id: i64, amount: f64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO material_ledger (material_id, cantidad_entrada, cantidad_salida, usos)
            VALUES (?1, ?2, 0, 1)
            ON CONFLICT(material_id) DO UPDATE SET
                cantidad_entrada = cantidad_entrada + excluded.cantidad_entrada,
                usos = usos + 1
            "#,
            params![material_id, amount],
        )?;
        Ok(())
    }

    fn record_dispatch(&self, material_id: i64, amount: f64) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO material_ledger (material_id, cantidad_entrada, cantidad_salida, usos)
            VALUES (?1, 0, ?2, 1)
            ON CONFLICT(material_id) DO UPDATE SET
                cantidad_salida = cantidad_salida + excluded.cantidad_salida,
                usos = usos + 1
            "#,
            params![material_id, amount],
        )?;
        Ok(())
    }
}

// ==========================================
// MaterialLedgerRepository - 台账查询
// ==========================================
pub struct MaterialLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialLedgerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按物料ID查询台账
    pub fn find_by_id(&self, material_id: i64) -> RepositoryResult<Option<MaterialLedgerEntry>> {
        let conn = self.get_conn()?;
        let entry = conn
            .query_row(
                r#"
                SELECT material_id, cantidad_entrada, cantidad_salida, usos
                FROM material_ledger
                WHERE material_id = ?1
                "#,
                params![material_id],
                map_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// 查询全部台账及物料名称（无目录记录时名称为 None）
    pub fn list_with_names(&self) -> RepositoryResult<Vec<NamedLedgerEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ml.material_id, ml.cantidad_entrada, ml.cantidad_salida, ml.usos, md.nombre
            FROM material_ledger ml
            LEFT JOIN material_def md ON md.id = ml.material_id
            ORDER BY ml.material_id
            "#,
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(NamedLedgerEntry {
                    entry: map_entry(row)?,
                    nombre: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }
}

fn map_entry(row: &Row<'_>) -> SqliteResult<MaterialLedgerEntry> {
    Ok(MaterialLedgerEntry {
        material_id: row.get(0)?,
        cantidad_entrada: row.get(1)?,
        cantidad_salida: row.get(2)?,
        usos: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        Arc::new(Mutex::new(crate::db::open_in_memory().unwrap()))
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let conn = setup_test_db();
        {
            let c = conn.lock().unwrap();
            let ledger = SqliteMaterialLedger::new(&c);
            ledger.ensure(1).unwrap();
            ledger.ensure(1).unwrap();
        }
        let repo = MaterialLedgerRepository::new(conn);
        assert_eq!(repo.find_by_id(1).unwrap(), Some(MaterialLedgerEntry::empty(1)));
        assert_eq!(repo.list_with_names().unwrap().len(), 1);
    }

    #[test]
    fn test_receipts_and_dispatches_accumulate() {
        let conn = setup_test_db();
        {
            let c = conn.lock().unwrap();
            let ledger = SqliteMaterialLedger::new(&c);
            ledger.record_receipt(3, 50.0).unwrap();
            ledger.record_receipt(3, 10.5).unwrap();
            ledger.record_dispatch(3, 40.0).unwrap();
        }
        let entry = MaterialLedgerRepository::new(conn).find_by_id(3).unwrap().unwrap();
        assert_eq!(entry.cantidad_entrada, 60.5);
        assert_eq!(entry.cantidad_salida, 40.0);
        assert_eq!(entry.usos, 3);
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let conn = setup_test_db();
        {
            let c = conn.lock().unwrap();
            let tx = c.unchecked_transaction().unwrap();
            SqliteMaterialLedger::new(&tx).record_receipt(9, 5.0).unwrap();
            // tx drop => rollback
        }
        assert!(MaterialLedgerRepository::new(conn).find_by_id(9).unwrap().is_none());
    }

    #[test]
    fn test_list_with_names_left_join() {
        let conn = setup_test_db();
        {
            let c = conn.lock().unwrap();
            c.execute(
                "INSERT INTO material_def (id, nombre, tipo) VALUES (1, 'Acero', 'float')",
                [],
            )
            .unwrap();
            let ledger = SqliteMaterialLedger::new(&c);
            ledger.ensure(1).unwrap();
            ledger.ensure(2).unwrap();
        }
        let rows = MaterialLedgerRepository::new(conn).list_with_names().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].nombre.as_deref(), Some("Acero"));
        assert!(rows[1].nombre.is_none());
    }
}
