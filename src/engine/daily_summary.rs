// ==========================================
// 工序执行质量追踪系统 - 每日汇总
// ==========================================
// 职责: 统计今日/昨日活动日志数量与执行产量，写入 JSON 缓存文件
// 日期边界: 按固定时区的本地零点划分，查询时换算回 UTC
// ==========================================

use crate::domain::types::ActivityKind;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFAULT_SUMMARY_PATH: &str = "data/resumen_dia.json";

// ==========================================
// 汇总数据结构
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub fecha: NaiveDate,
    pub indicadores: i64,
    pub procesos: i64,
    pub entradas_salidas: i64,
    pub procesos_ejecutados: i64,
    pub produccion: i64,
    pub no_conformes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub hoy: DaySummary,
    pub ayer: DaySummary,
}

// ==========================================
// DailyActivitySource - 汇总数据来源
// ==========================================
// 时间参数均为 UTC，区间左闭右开
pub trait DailyActivitySource {
    /// 区间内指定类别的活动日志数
    fn count_activity(
        &self,
        kind: ActivityKind,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<i64>;

    /// 区间内有执行日志的执行记录的 (合格, 不合格) 合计
    fn execution_totals(&self, from: NaiveDateTime, to: NaiveDateTime)
        -> RepositoryResult<(i64, i64)>;
}

// ==========================================
// SummaryCache - 汇总缓存文件
// ==========================================
#[derive(Debug, Clone)]
pub struct SummaryCache {
    path: PathBuf,
}

impl SummaryCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, summary: &DailySummary) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::from)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// 文件不存在返回 None
    pub fn read(&self) -> EngineResult<Option<DailySummary>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let summary = serde_json::from_str(&raw).map_err(std::io::Error::from)?;
        Ok(Some(summary))
    }
}

// ==========================================
// DailySummaryService - 每日汇总服务
// ==========================================
#[derive(Debug, Clone)]
pub struct DailySummaryService {
    offset: FixedOffset,
    cache: SummaryCache,
}

impl DailySummaryService {
    pub fn new(offset: FixedOffset, cache: SummaryCache) -> Self {
        Self { offset, cache }
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// 生成今日与昨日汇总并写入缓存
    #[instrument(skip(self, source), fields(path = %self.cache.path().display()))]
    pub fn generate(
        &self,
        now: DateTime<Utc>,
        source: &dyn DailyActivitySource,
    ) -> EngineResult<DailySummary> {
        let hoy = now.with_timezone(&self.offset).date_naive();
        let ayer = hoy - Duration::days(1);

        let summary = DailySummary {
            hoy: self.summarize_day(hoy, source)?,
            ayer: self.summarize_day(ayer, source)?,
        };
        self.cache.write(&summary)?;

        info!(
            fecha = %hoy,
            procesos_ejecutados = summary.hoy.procesos_ejecutados,
            produccion = summary.hoy.produccion,
            "每日汇总已生成"
        );
        Ok(summary)
    }

    /// 读取缓存（不重新统计）
    pub fn read_cached(&self) -> EngineResult<Option<DailySummary>> {
        self.cache.read()
    }

    fn summarize_day(
        &self,
        fecha: NaiveDate,
        source: &dyn DailyActivitySource,
    ) -> EngineResult<DaySummary> {
        let (from, to) = self.day_bounds_utc(fecha);
        debug!(%fecha, %from, %to, "统计区间");

        let count = |kind| {
            source
                .count_activity(kind, from, to)
                .map_err(EngineError::SummarySource)
        };
        let (produccion, no_conformes) = source
            .execution_totals(from, to)
            .map_err(EngineError::SummarySource)?;

        Ok(DaySummary {
            fecha,
            indicadores: count(ActivityKind::Indicator)?,
            procesos: count(ActivityKind::Process)?,
            entradas_salidas: count(ActivityKind::Material)?,
            procesos_ejecutados: count(ActivityKind::Execution)?,
            produccion,
            no_conformes,
        })
    }

    /// 本地日期 → UTC 区间 [当日零点, 次日零点)
    fn day_bounds_utc(&self, fecha: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let shift = Duration::seconds(self.offset.local_minus_utc() as i64);
        let from = fecha.and_time(NaiveTime::MIN) - shift;
        (from, from + Duration::days(1))
    }
}
