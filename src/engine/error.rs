// ==========================================
// 工序执行质量追踪系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 规则解析错误 =====
    #[error("判据格式错误 (indicator_id={indicator_id}): {raw}")]
    InvalidCriteria { indicator_id: i64, raw: String },

    #[error("区间格式错误 (indicator_id={indicator_id}): 期望 \"min-max\"，实际 {raw}")]
    InvalidRange { indicator_id: i64, raw: String },

    // ===== 协作方错误 =====
    #[error("物料台账更新失败: {0}")]
    Ledger(#[source] RepositoryError),

    #[error("执行记录写入失败: {0}")]
    Store(#[source] RepositoryError),

    // ===== 可用时段/每日汇总 =====
    #[error("可用时段无效: start_hour={start_hour}, duration_hours={duration_hours}")]
    InvalidSchedule { start_hour: u32, duration_hours: u32 },

    #[error("每日汇总数据读取失败: {0}")]
    SummarySource(#[source] RepositoryError),

    #[error("每日汇总缓存读写失败: {0}")]
    SummaryCache(#[from] std::io::Error),
}

impl EngineError {
    /// 是否为输入校验类错误
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidCriteria { .. } | EngineError::InvalidRange { .. }
        )
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
