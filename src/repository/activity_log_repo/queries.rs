use super::core::ActivityLogRepository;
use crate::domain::activity_log::ActivityLog;
use crate::domain::types::ActivityKind;
use crate::engine::daily_summary::DailyActivitySource;
use crate::repository::error::RepositoryResult;
use crate::repository::timestamp::{format_ts, read_ts};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Result as SqliteResult, Row};

impl ActivityLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 activity_id 查询单个日志
    pub fn find_by_id(&self, activity_id: &str) -> RepositoryResult<Option<ActivityLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, kind, ref_id, actor_id, description, created_at
            FROM activity_log
            WHERE activity_id = ?
            "#,
        )?;

        match stmt.query_row(params![activity_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某实体的全部日志（按时间倒序）
    pub fn find_by_ref(&self, kind: ActivityKind, ref_id: i64) -> RepositoryResult<Vec<ActivityLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, kind, ref_id, actor_id, description, created_at
            FROM activity_log
            WHERE kind = ? AND ref_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let logs = stmt
            .query_map(params![kind.as_str(), ref_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的日志
    pub fn find_recent(&self, limit: i64) -> RepositoryResult<Vec<ActivityLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, kind, ref_id, actor_id, description, created_at
            FROM activity_log
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    // ==========================================
    // 统计操作（区间左闭右开, UTC）
    // ==========================================

    /// 统计区间内指定类别的日志数
    pub fn count_by_kind_between(
        &self,
        kind: ActivityKind,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM activity_log
            WHERE kind = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
            params![kind.as_str(), format_ts(&from), format_ts(&to)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 区间内有执行日志的执行记录的合格/不合格合计
    pub fn execution_totals_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let totals = conn.query_row(
            r#"
            SELECT COALESCE(SUM(pe.conformidades), 0),
                   COALESCE(SUM(pe.no_conformidades), 0)
            FROM activity_log al
            JOIN proceso_ejecutado pe ON pe.id = al.ref_id
            WHERE al.kind = ?1 AND al.created_at >= ?2 AND al.created_at < ?3
            "#,
            params![
                ActivityKind::Execution.as_str(),
                format_ts(&from),
                format_ts(&to)
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }
}

impl DailyActivitySource for ActivityLogRepository {
    fn count_activity(
        &self,
        kind: ActivityKind,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        self.count_by_kind_between(kind, from, to)
    }

    fn execution_totals(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<(i64, i64)> {
        self.execution_totals_between(from, to)
    }
}

/// 映射数据库行到 ActivityLog
fn map_row(row: &Row<'_>) -> SqliteResult<ActivityLog> {
    let kind_raw: String = row.get(1)?;
    let kind = ActivityKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("未知的日志类别: {}", kind_raw).into(),
        )
    })?;

    Ok(ActivityLog {
        activity_id: row.get(0)?,
        kind,
        ref_id: row.get(2)?,
        actor_id: row.get(3)?,
        description: row.get(4)?,
        created_at: read_ts(row, 5)?,
    })
}
