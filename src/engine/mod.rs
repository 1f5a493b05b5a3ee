// ==========================================
// 工序执行质量追踪系统 - 引擎层
// ==========================================
// 职责: 指标评估、阶段处理、执行聚合、统计归约
// 红线: Engine 不拼 SQL，持久化通过协作方 Trait 完成
// ==========================================

pub mod availability;
pub mod daily_summary;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod random;
pub mod stage;
pub mod statistics;

// 重导出核心引擎
pub use availability::{AvailabilityGate, AvailabilitySchedule, AvailabilityStatus};
pub use daily_summary::{
    DailyActivitySource, DailySummary, DailySummaryService, DaySummary, SummaryCache,
};
pub use error::{EngineError, EngineResult};
pub use execution::{ExecutionAggregator, ExecutionStore, MaterialLedger};
pub use indicator::{IndicatorEvaluator, IndicatorOutcome};
pub use random::{RandomSource, RandomSourceFactory};
pub use stage::StageProcessor;
pub use statistics::{
    MaterialStateRow, NonConformityDiagram, ProcessSuccess, ProcessSuccessRanking,
    StageOverviewRow, StatisticsAggregator, StatisticsReport,
};
