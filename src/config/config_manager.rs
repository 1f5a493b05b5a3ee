// ==========================================
// 工序执行质量追踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::availability::{
    AvailabilitySchedule, DEFAULT_DURATION_HOURS, DEFAULT_START_HOUR, DEFAULT_UTC_OFFSET_HOURS,
};
use crate::engine::daily_summary::DEFAULT_SUMMARY_PATH;
use crate::engine::indicator::DEFAULT_CHECKBOX_PENALTY_RATIO;
use crate::engine::statistics::DEFAULT_STAGE_NUMBERS;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

// ==========================================
// ConfigError - 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值超出范围 ({key}={value}): {reason}")]
    OutOfRange {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置存储失败: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    // ===== 指标评估配置 =====

    /// 复选框指标随机不合格量比例（无效值回退默认）
    pub fn checkbox_penalty_ratio(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(
            config_keys::CHECKBOX_PENALTY_RATIO,
            &DEFAULT_CHECKBOX_PENALTY_RATIO.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(DEFAULT_CHECKBOX_PENALTY_RATIO))
    }

    /// 固定随机种子（未配置则使用熵源）
    pub fn random_seed(&self) -> ConfigResult<Option<u64>> {
        Ok(self
            .get_global_config_value(config_keys::RANDOM_SEED)?
            .and_then(|v| v.trim().parse::<u64>().ok()))
    }

    // ===== 统计配置 =====

    /// 阶段总体统计的阶段编号列表（逗号分隔）
    pub fn stats_stage_numbers(&self) -> ConfigResult<Vec<i64>> {
        let value = self.get_config_or_default(config_keys::STATS_STAGE_NUMBERS, "")?;

        let numbers: Vec<i64> = value
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect();

        if numbers.is_empty() {
            Ok(DEFAULT_STAGE_NUMBERS.to_vec())
        } else {
            Ok(numbers)
        }
    }

    /// 每日汇总缓存文件路径
    pub fn daily_summary_path(&self) -> ConfigResult<String> {
        let value =
            self.get_config_or_default(config_keys::DAILY_SUMMARY_PATH, DEFAULT_SUMMARY_PATH)?;
        if value.trim().is_empty() {
            return Ok(DEFAULT_SUMMARY_PATH.to_string());
        }
        Ok(value)
    }

    // ===== 可用时段配置 =====

    /// 可用时段（存储值无效时回退默认）
    pub fn availability_schedule(&self) -> ConfigResult<AvailabilitySchedule> {
        let start = self
            .get_config_or_default(
                config_keys::AVAILABILITY_START_HOUR,
                &DEFAULT_START_HOUR.to_string(),
            )?
            .trim()
            .parse::<u32>()
            .unwrap_or(DEFAULT_START_HOUR);
        let duration = self
            .get_config_or_default(
                config_keys::AVAILABILITY_DURATION_HOURS,
                &DEFAULT_DURATION_HOURS.to_string(),
            )?
            .trim()
            .parse::<u32>()
            .unwrap_or(DEFAULT_DURATION_HOURS);

        match AvailabilitySchedule::new(start, duration) {
            Ok(schedule) => Ok(schedule),
            Err(e) => {
                warn!(error = %e, "存储的可用时段无效，使用默认值");
                Ok(AvailabilitySchedule::default())
            }
        }
    }

    /// 时区偏移（小时）
    pub fn utc_offset_hours(&self) -> ConfigResult<i32> {
        let value = self.get_config_or_default(
            config_keys::AVAILABILITY_UTC_OFFSET_HOURS,
            &DEFAULT_UTC_OFFSET_HOURS.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|h| (-23..=23).contains(h))
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS))
    }

    /// 校验并持久化可用时段
    ///
    /// 约束: 0 <= start_hour < 24, 0 < duration_hours <= 24
    pub fn save_availability_schedule(
        &self,
        start_hour: u32,
        duration_hours: u32,
    ) -> ConfigResult<AvailabilitySchedule> {
        if start_hour >= 24 {
            return Err(ConfigError::OutOfRange {
                key: config_keys::AVAILABILITY_START_HOUR.to_string(),
                value: start_hour.to_string(),
                reason: "必须在 0-23 之间".to_string(),
            });
        }
        if duration_hours == 0 || duration_hours > 24 {
            return Err(ConfigError::OutOfRange {
                key: config_keys::AVAILABILITY_DURATION_HOURS.to_string(),
                value: duration_hours.to_string(),
                reason: "必须在 1-24 之间".to_string(),
            });
        }

        let schedule = AvailabilitySchedule {
            start_hour,
            duration_hours,
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (key, value) in [
            (config_keys::AVAILABILITY_START_HOUR, start_hour),
            (config_keys::AVAILABILITY_DURATION_HOURS, duration_hours),
        ] {
            tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value.to_string()],
            )?;
        }
        tx.commit()?;

        info!(start_hour, duration_hours, "可用时段已持久化");
        Ok(schedule)
    }
}

#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_checkbox_penalty_ratio(&self) -> Result<f64, Box<dyn Error>> {
        Ok(self.checkbox_penalty_ratio()?)
    }

    async fn get_random_seed(&self) -> Result<Option<u64>, Box<dyn Error>> {
        Ok(self.random_seed()?)
    }

    async fn get_stats_stage_numbers(&self) -> Result<Vec<i64>, Box<dyn Error>> {
        Ok(self.stats_stage_numbers()?)
    }

    async fn get_daily_summary_path(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.daily_summary_path()?)
    }

    async fn get_availability_schedule(&self) -> Result<AvailabilitySchedule, Box<dyn Error>> {
        Ok(self.availability_schedule()?)
    }

    async fn get_utc_offset_hours(&self) -> Result<i32, Box<dyn Error>> {
        Ok(self.utc_offset_hours()?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 指标评估
    pub const CHECKBOX_PENALTY_RATIO: &str = "checkbox_penalty_ratio";
    pub const RANDOM_SEED: &str = "random_seed";

    // 统计
    pub const STATS_STAGE_NUMBERS: &str = "stats_stage_numbers";

    // 每日汇总
    pub const DAILY_SUMMARY_PATH: &str = "daily_summary_path";

    // 可用时段
    pub const AVAILABILITY_START_HOUR: &str = "availability_start_hour";
    pub const AVAILABILITY_DURATION_HOURS: &str = "availability_duration_hours";
    pub const AVAILABILITY_UTC_OFFSET_HOURS: &str = "availability_utc_offset_hours";
}
