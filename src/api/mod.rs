// ==========================================
// 工序执行质量追踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与上层服务调用
// ==========================================

pub mod catalog_api;
pub mod config_api;
pub mod error;
pub mod execution_api;
pub mod statistics_api;

// 重导出核心类型
pub use catalog_api::CatalogApi;
pub use config_api::{ConfigApi, GenerateSummaryResponse, ScheduleUpdateResponse};
pub use error::{ApiError, ApiResult};
pub use execution_api::{ExecutionApi, ExecutionResponse, PreviewResponse};
pub use statistics_api::StatisticsApi;
