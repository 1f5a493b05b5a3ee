// ==========================================
// 工序执行质量追踪系统 - 目录数据仓储
// ==========================================
// 表: process_def, material_def, indicator_def
// 红线: 创建实体与写活动日志在同一事务内
// ==========================================

use crate::domain::activity_log::ActivityLog;
use crate::domain::catalog::{
    IndicatorDefinition, MaterialDefinition, NewIndicator, NewMaterial, NewProcess,
    ProcessDefinition,
};
use crate::domain::types::{ActivityKind, IndicatorKind, ValueKind};
use crate::repository::activity_log_repo::ActivityLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

// ==========================================
// ProcessDefRepository - 工艺流程定义
// ==========================================
pub struct ProcessDefRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProcessDefRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 创建流程并记录活动日志
    pub fn create(&self, new: &NewProcess, actor_id: i64) -> RepositoryResult<ProcessDefinition> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO process_def (nombre, descripcion, num_etapas) VALUES (?1, ?2, ?3)",
            params![new.nombre, new.descripcion, new.num_etapas],
        )?;
        let id = tx.last_insert_rowid();

        ActivityLogRepository::insert_with_conn(
            &tx,
            &ActivityLog::new(
                ActivityKind::Process,
                id,
                actor_id,
                format!("Proceso '{}' creado con {} etapas.", new.nombre, new.num_etapas),
            ),
        )?;
        tx.commit()?;

        Ok(ProcessDefinition {
            id,
            nombre: new.nombre.clone(),
            descripcion: new.descripcion.clone(),
            num_etapas: new.num_etapas,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<ProcessDefinition>> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT id, nombre, descripcion, num_etapas FROM process_def WHERE id = ?1",
                params![id],
                map_process,
            )
            .optional()?;
        Ok(found)
    }

    pub fn update(&self, process: &ProcessDefinition) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE process_def SET nombre = ?2, descripcion = ?3, num_etapas = ?4 WHERE id = ?1",
            params![process.id, process.nombre, process.descripcion, process.num_etapas],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Proceso", process.id));
        }
        Ok(())
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<ProcessDefinition>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT id, nombre, descripcion, num_etapas FROM process_def ORDER BY id")?;
        let rows = stmt
            .query_map([], map_process)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 流程ID → 名称
    pub fn name_map(&self) -> RepositoryResult<HashMap<i64, String>> {
        Ok(self
            .list_all()?
            .into_iter()
            .map(|p| (p.id, p.nombre))
            .collect())
    }
}

fn map_process(row: &Row<'_>) -> SqliteResult<ProcessDefinition> {
    Ok(ProcessDefinition {
        id: row.get(0)?,
        nombre: row.get(1)?,
        descripcion: row.get(2)?,
        num_etapas: row.get(3)?,
    })
}

// ==========================================
// MaterialDefRepository - 物料定义
// ==========================================
pub struct MaterialDefRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialDefRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 创建物料并记录活动日志
    pub fn create(&self, new: &NewMaterial, actor_id: i64) -> RepositoryResult<MaterialDefinition> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO material_def (nombre, tipo) VALUES (?1, ?2)",
            params![new.nombre, new.tipo.to_string()],
        )?;
        let id = tx.last_insert_rowid();

        ActivityLogRepository::insert_with_conn(
            &tx,
            &ActivityLog::new(
                ActivityKind::Material,
                id,
                actor_id,
                format!("Entrada/salida '{}' creada.", new.nombre),
            ),
        )?;
        tx.commit()?;

        Ok(MaterialDefinition {
            id,
            nombre: new.nombre.clone(),
            tipo: new.tipo,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MaterialDefinition>> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT id, nombre, tipo FROM material_def WHERE id = ?1",
                params![id],
                map_material,
            )
            .optional()?;
        Ok(found)
    }

    pub fn update(&self, material: &MaterialDefinition) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE material_def SET nombre = ?2, tipo = ?3 WHERE id = ?1",
            params![material.id, material.nombre, material.tipo.to_string()],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("EntradaSalida", material.id));
        }
        Ok(())
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<MaterialDefinition>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT id, nombre, tipo FROM material_def ORDER BY id")?;
        let rows = stmt
            .query_map([], map_material)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_material(row: &Row<'_>) -> SqliteResult<MaterialDefinition> {
    let tipo: String = row.get(2)?;
    Ok(MaterialDefinition {
        id: row.get(0)?,
        nombre: row.get(1)?,
        tipo: ValueKind::from_str(&tipo),
    })
}

// ==========================================
// IndicatorDefRepository - 指标定义
// ==========================================
pub struct IndicatorDefRepository {
    conn: Arc<Mutex<Connection>>,
}

impl IndicatorDefRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 创建指标并记录活动日志
    pub fn create(&self, new: &NewIndicator, actor_id: i64) -> RepositoryResult<IndicatorDefinition> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO indicator_def (nombre, tipo, entrada_id) VALUES (?1, ?2, ?3)",
            params![new.nombre, new.tipo.to_string(), new.entrada_id],
        )?;
        let id = tx.last_insert_rowid();

        ActivityLogRepository::insert_with_conn(
            &tx,
            &ActivityLog::new(
                ActivityKind::Indicator,
                id,
                actor_id,
                format!("Indicador '{}' ({}) creado.", new.nombre, new.tipo),
            ),
        )?;
        tx.commit()?;

        Ok(IndicatorDefinition {
            id,
            nombre: new.nombre.clone(),
            tipo: new.tipo,
            entrada_id: new.entrada_id,
        })
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<IndicatorDefinition>> {
        let conn = lock(&self.conn)?;
        let found = conn
            .query_row(
                "SELECT id, nombre, tipo, entrada_id FROM indicator_def WHERE id = ?1",
                params![id],
                map_indicator,
            )
            .optional()?;
        Ok(found)
    }

    pub fn update(&self, indicator: &IndicatorDefinition) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let rows = conn.execute(
            "UPDATE indicator_def SET nombre = ?2, tipo = ?3, entrada_id = ?4 WHERE id = ?1",
            params![
                indicator.id,
                indicator.nombre,
                indicator.tipo.to_string(),
                indicator.entrada_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("Indicador", indicator.id));
        }
        Ok(())
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<IndicatorDefinition>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT id, nombre, tipo, entrada_id FROM indicator_def ORDER BY id")?;
        let rows = stmt
            .query_map([], map_indicator)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某输入物料的全部指标
    pub fn list_by_entrada(&self, entrada_id: i64) -> RepositoryResult<Vec<IndicatorDefinition>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT id, nombre, tipo, entrada_id FROM indicator_def WHERE entrada_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![entrada_id], map_indicator)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_indicator(row: &Row<'_>) -> SqliteResult<IndicatorDefinition> {
    let tipo_raw: String = row.get(2)?;
    let tipo = IndicatorKind::parse(&tipo_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("未知的指标类型: {}", tipo_raw).into(),
        )
    })?;
    Ok(IndicatorDefinition {
        id: row.get(0)?,
        nombre: row.get(1)?,
        tipo,
        entrada_id: row.get(3)?,
    })
}
