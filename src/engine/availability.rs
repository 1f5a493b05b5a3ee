// ==========================================
// 工序执行质量追踪系统 - 可用时段
// ==========================================
// 职责: 判断当前时刻是否处于系统可用时段
// 约束: 时段只保存在 Gate 实例内（RwLock），不使用全局可变状态
// 时区: 固定 UTC 偏移（默认 -5h）
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::info;

pub const DEFAULT_START_HOUR: u32 = 4;
pub const DEFAULT_DURATION_HOURS: u32 = 1;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -5;

// ==========================================
// AvailabilitySchedule - 可用时段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySchedule {
    pub start_hour: u32,     // 0..=23
    pub duration_hours: u32, // 1..=24
}

impl AvailabilitySchedule {
    /// 校验并创建时段
    pub fn new(start_hour: u32, duration_hours: u32) -> EngineResult<Self> {
        if start_hour >= 24 || duration_hours == 0 || duration_hours > 24 {
            return Err(EngineError::InvalidSchedule {
                start_hour,
                duration_hours,
            });
        }
        Ok(Self {
            start_hour,
            duration_hours,
        })
    }
}

impl Default for AvailabilitySchedule {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            duration_hours: DEFAULT_DURATION_HOURS,
        }
    }
}

/// 可用状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStatus {
    pub disponible: bool,
    pub inicio: String, // HH:MM
    pub fin: String,    // HH:MM
}

/// 小时偏移转换为 FixedOffset（超出 ±23h 返回 None）
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    if !(-23..=23).contains(&hours) {
        return None;
    }
    FixedOffset::east_opt(hours * 3600)
}

// ==========================================
// AvailabilityGate - 可用时段判定
// ==========================================
#[derive(Debug)]
pub struct AvailabilityGate {
    schedule: RwLock<AvailabilitySchedule>,
    offset: FixedOffset,
}

impl AvailabilityGate {
    pub fn new(schedule: AvailabilitySchedule, offset: FixedOffset) -> Self {
        Self {
            schedule: RwLock::new(schedule),
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// 当前时段
    pub fn schedule(&self) -> AvailabilitySchedule {
        match self.schedule.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// 替换时段（调用方负责权限校验与持久化）
    pub fn update(&self, schedule: AvailabilitySchedule) {
        let mut guard = match self.schedule.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = schedule;
        info!(
            start_hour = schedule.start_hour,
            duration_hours = schedule.duration_hours,
            "可用时段已更新"
        );
    }

    /// 计算 now 所在本地日期的 [开始, 结束]
    fn window(&self, now: DateTime<Utc>) -> (NaiveDateTime, NaiveDateTime, NaiveDateTime) {
        let schedule = self.schedule();
        let local = now.with_timezone(&self.offset).naive_local();
        let midnight = local.date().and_time(NaiveTime::MIN);
        let start = midnight + Duration::hours(schedule.start_hour as i64);
        let end = start + Duration::hours(schedule.duration_hours as i64);
        (local, start, end)
    }

    /// 是否处于可用时段（两端闭区间）
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        let (local, start, end) = self.window(now);
        start <= local && local <= end
    }

    pub fn status(&self, now: DateTime<Utc>) -> AvailabilityStatus {
        let (local, start, end) = self.window(now);
        AvailabilityStatus {
            disponible: start <= local && local <= end,
            inicio: start.format("%H:%M").to_string(),
            fin: end.format("%H:%M").to_string(),
        }
    }
}

impl Default for AvailabilityGate {
    fn default() -> Self {
        let offset = offset_from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|| Utc.fix());
        Self::new(AvailabilitySchedule::default(), offset)
    }
}
