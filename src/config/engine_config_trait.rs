// ==========================================
// 工序执行质量追踪系统 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎组装所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::availability::AvailabilitySchedule;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 指标评估 =====

    /// 复选框指标随机不合格量比例
    ///
    /// # 默认值
    /// - 0.1
    async fn get_checkbox_penalty_ratio(&self) -> Result<f64, Box<dyn Error>>;

    /// 固定随机种子（None 表示使用熵源）
    async fn get_random_seed(&self) -> Result<Option<u64>, Box<dyn Error>>;

    // ===== 统计 =====

    /// 阶段总体统计的阶段编号
    ///
    /// # 默认值
    /// - [0, 1, 2, 3, 4]
    async fn get_stats_stage_numbers(&self) -> Result<Vec<i64>, Box<dyn Error>>;

    // ===== 每日汇总 / 可用时段 =====

    /// 每日汇总缓存文件路径
    ///
    /// # 默认值
    /// - data/resumen_dia.json
    async fn get_daily_summary_path(&self) -> Result<String, Box<dyn Error>>;

    /// 可用时段
    ///
    /// # 默认值
    /// - 04:00 起 1 小时
    async fn get_availability_schedule(&self) -> Result<AvailabilitySchedule, Box<dyn Error>>;

    /// 时区偏移（小时）
    ///
    /// # 默认值
    /// - -5
    async fn get_utc_offset_hours(&self) -> Result<i32, Box<dyn Error>>;
}
