use crate::domain::activity_log::ActivityLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::timestamp::format_ts;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActivityLogRepository - 活动日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActivityLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityLogRepository {
    /// 创建新的活动日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入活动日志
    ///
    /// # 返回
    /// - `Ok(activity_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActivityLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        Self::insert_with_conn(&conn, log)
    }

    /// 在已有连接/事务上插入活动日志
    ///
    /// 供执行事务与目录创建事务复用，调用方负责提交
    pub fn insert_with_conn(conn: &Connection, log: &ActivityLog) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO activity_log (
                activity_id, kind, ref_id, actor_id, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                log.activity_id,
                log.kind.as_str(),
                log.ref_id,
                log.actor_id,
                log.description,
                format_ts(&log.created_at),
            ],
        )?;

        Ok(log.activity_id.clone())
    }
}
