// ==========================================
// 工序执行质量追踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 流程执行、阶段质量评估与统计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ActivityKind, Caller, CallerRole, IndicatorKind, ValueKind};

// 领域实体
pub use domain::{
    ActivityLog, ExecutionRecord, ExecutionRequest, IndicatorRule, Stage, StageRecord,
    StageResult,
};

// 引擎
pub use engine::{
    AvailabilityGate, DailySummaryService, ExecutionAggregator, IndicatorEvaluator,
    StageProcessor, StatisticsAggregator,
};

// API
pub use api::{ApiError, CatalogApi, ConfigApi, ExecutionApi, StatisticsApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工序执行质量追踪系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
