// ==========================================
// 工序执行质量追踪系统 - 执行记录数据仓储
// ==========================================
// 表: proceso_ejecutado (汇总行), execution_history (完整记录 JSON，只追加)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::activity_log::ActivityLog;
use crate::domain::execution::{ExecutionRecord, ExecutionShell, ExecutionSummary, ExecutionTotals};
use crate::domain::types::ActivityKind;
use crate::engine::execution::ExecutionStore;
use crate::repository::activity_log_repo::ActivityLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::timestamp::{format_ts, read_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// SqliteExecutionStore - 事务内执行记录写入
// ==========================================
pub struct SqliteExecutionStore<'c> {
    conn: &'c Connection,
    actor_id: i64,
}

impl<'c> SqliteExecutionStore<'c> {
    /// actor_id: 写入活动日志的操作人
    pub fn new(conn: &'c Connection, actor_id: i64) -> Self {
        Self { conn, actor_id }
    }
}

impl ExecutionStore for SqliteExecutionStore<'_> {
    fn create_shell(&self, shell: &ExecutionShell) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO proceso_ejecutado (id_proceso, cantidad_entrada, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![
                shell.id_proceso,
                shell.cantidad_entrada,
                format_ts(&chrono::Utc::now().naive_utc()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(execution_id = id, id_proceso = shell.id_proceso, "执行记录初始行已创建");
        Ok(id)
    }

    fn finalize(&self, execution_id: i64, totals: &ExecutionTotals) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            r#"
            UPDATE proceso_ejecutado SET
                conformidades = ?2,
                no_conformidades = ?3,
                num_etapas_con_conformidades = ?4,
                tasa_de_exito = ?5,
                cantidad_salida = ?6
            WHERE id = ?1
            "#,
            params![
                execution_id,
                totals.conformidades,
                totals.no_conformidades,
                totals.num_etapas_con_conformidades,
                totals.tasa_de_exito,
                totals.cantidad_salida,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("ProcesoEjecutado", execution_id));
        }
        Ok(())
    }

    fn append_history(&self, record: &ExecutionRecord) -> RepositoryResult<()> {
        let payload = serde_json::to_string(record)?;
        self.conn.execute(
            r#"
            INSERT INTO execution_history (id_proceso_ejecutado, id_proceso, payload_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                record.id_proceso_ejecutado,
                record.id_proceso,
                payload,
                format_ts(&record.created_at),
            ],
        )?;
        Ok(())
    }

    fn log_activity(&self, execution_id: i64, description: &str) -> RepositoryResult<()> {
        let log = ActivityLog::new(
            ActivityKind::Execution,
            execution_id,
            self.actor_id,
            description.to_string(),
        );
        ActivityLogRepository::insert_with_conn(self.conn, &log)?;
        Ok(())
    }
}

// ==========================================
// ExecutionRepository - 执行记录查询
// ==========================================
pub struct ExecutionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExecutionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询执行汇总行
    pub fn find_summary(&self, execution_id: i64) -> RepositoryResult<Option<ExecutionSummary>> {
        let conn = self.get_conn()?;
        let summary = conn
            .query_row(
                r#"
                SELECT id, id_proceso, num_etapas_con_conformidades, tasa_de_exito,
                       no_conformidades, conformidades, cantidad_entrada, cantidad_salida,
                       created_at
                FROM proceso_ejecutado
                WHERE id = ?1
                "#,
                params![execution_id],
                map_summary,
            )
            .optional()?;
        Ok(summary)
    }

    /// 查询某流程的全部执行汇总
    pub fn list_summaries_by_process(&self, id_proceso: i64) -> RepositoryResult<Vec<ExecutionSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, id_proceso, num_etapas_con_conformidades, tasa_de_exito,
                   no_conformidades, conformidades, cantidad_entrada, cantidad_salida,
                   created_at
            FROM proceso_ejecutado
            WHERE id_proceso = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt
            .query_map(params![id_proceso], map_summary)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询单条完整执行记录
    pub fn find_record(&self, execution_id: i64) -> RepositoryResult<Option<ExecutionRecord>> {
        let conn = self.get_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM execution_history WHERE id_proceso_ejecutado = ?1",
                params![execution_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 查询全部执行历史（按执行ID升序）
    pub fn list_history(&self) -> RepositoryResult<Vec<ExecutionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload_json FROM execution_history ORDER BY id_proceso_ejecutado",
        )?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(RepositoryError::from))
            .collect()
    }
}

fn map_summary(row: &Row<'_>) -> SqliteResult<ExecutionSummary> {
    Ok(ExecutionSummary {
        id: row.get(0)?,
        id_proceso: row.get(1)?,
        num_etapas_con_conformidades: row.get(2)?,
        tasa_de_exito: row.get(3)?,
        no_conformidades: row.get(4)?,
        conformidades: row.get(5)?,
        cantidad_entrada: row.get(6)?,
        cantidad_salida: row.get(7)?,
        created_at: read_ts(row, 8)?,
    })
}
