// ==========================================
// 工序执行质量追踪系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod activity_log_repo;
pub mod catalog_repo;
pub mod error;
pub mod execution_repo;
pub mod material_ledger_repo;
pub mod timestamp;

// 重导出核心仓储
pub use activity_log_repo::ActivityLogRepository;
pub use catalog_repo::{IndicatorDefRepository, MaterialDefRepository, ProcessDefRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use execution_repo::{ExecutionRepository, SqliteExecutionStore};
pub use material_ledger_repo::{MaterialLedgerRepository, SqliteMaterialLedger};
