// ==========================================
// 工序执行质量追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod activity_log;
pub mod catalog;
pub mod execution;
pub mod material;
pub mod stage;
pub mod types;

// 重导出核心类型
pub use activity_log::ActivityLog;
pub use catalog::{
    IndicatorDefinition, MaterialDefinition, NewIndicator, NewMaterial, NewProcess,
    ProcessDefinition,
};
pub use execution::{
    success_fraction, success_rate, ExecutionRecord, ExecutionRequest, ExecutionShell,
    ExecutionSummary, ExecutionTotals,
};
pub use material::{MaterialLedgerEntry, NamedLedgerEntry};
pub use stage::{
    Criterion, EntradaReading, IndicatorRule, RuleCheck, SalidaReading, Stage, StageRecord,
    StageResult,
};
pub use types::{ActivityKind, Caller, CallerRole, IndicatorKind, ValueKind};
