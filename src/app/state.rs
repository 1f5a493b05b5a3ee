// ==========================================
// 工序执行质量追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, ConfigApi, ExecutionApi, StatisticsApi};
use crate::config::{ConfigManager, EngineConfigReader};
use crate::engine::availability::{offset_from_hours, AvailabilityGate};
use crate::engine::daily_summary::{DailySummaryService, SummaryCache};
use crate::engine::{
    ExecutionAggregator, IndicatorEvaluator, RandomSourceFactory, StageProcessor,
    StatisticsAggregator,
};
use crate::repository::{
    activity_log_repo::ActivityLogRepository,
    catalog_repo::{IndicatorDefRepository, MaterialDefRepository, ProcessDefRepository},
    execution_repo::ExecutionRepository,
    material_ledger_repo::MaterialLedgerRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 流程执行API
    pub execution_api: Arc<ExecutionApi>,

    /// 统计API
    pub statistics_api: Arc<StatisticsApi>,

    /// 配置管理API（可用时段、每日汇总）
    pub config_api: Arc<ConfigApi>,

    /// 流程/物料/指标目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 活动日志仓储（用于审计追踪）
    pub activity_log_repo: Arc<ActivityLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表
    /// 2. 读取配置，初始化所有Engine
    /// 3. 初始化所有Repository和API实例
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_and_migrate(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 读取配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let penalty_ratio = config_manager
            .get_checkbox_penalty_ratio()
            .await
            .map_err(|e| format!("读取复选框惩罚比例失败: {}", e))?;
        let random_seed = config_manager
            .get_random_seed()
            .await
            .map_err(|e| format!("读取随机种子失败: {}", e))?;
        let stage_numbers = config_manager
            .get_stats_stage_numbers()
            .await
            .map_err(|e| format!("读取统计阶段编号失败: {}", e))?;
        let summary_path = config_manager
            .get_daily_summary_path()
            .await
            .map_err(|e| format!("读取汇总文件路径失败: {}", e))?;
        let schedule = config_manager
            .get_availability_schedule()
            .await
            .map_err(|e| format!("读取可用时段失败: {}", e))?;
        let offset_hours = config_manager
            .get_utc_offset_hours()
            .await
            .map_err(|e| format!("读取时区偏移失败: {}", e))?;
        let offset = offset_from_hours(offset_hours)
            .ok_or_else(|| format!("时区偏移超出范围: {}", offset_hours))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let execution_repo = Arc::new(ExecutionRepository::new(conn.clone()));
        let ledger_repo = Arc::new(MaterialLedgerRepository::new(conn.clone()));
        let activity_log_repo = Arc::new(ActivityLogRepository::new(conn.clone()));
        let process_repo = Arc::new(ProcessDefRepository::new(conn.clone()));
        let material_repo = Arc::new(MaterialDefRepository::new(conn.clone()));
        let indicator_repo = Arc::new(IndicatorDefRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let aggregator =
            ExecutionAggregator::new(StageProcessor::new(IndicatorEvaluator::new(penalty_ratio)));
        let rng_factory = match random_seed {
            Some(seed) => {
                tracing::info!(seed, "使用固定随机种子");
                RandomSourceFactory::Seeded(seed)
            }
            None => RandomSourceFactory::Entropy,
        };
        let statistics = StatisticsAggregator::new(stage_numbers);
        let gate = Arc::new(AvailabilityGate::new(schedule, offset));
        let summary_service = DailySummaryService::new(
            offset,
            SummaryCache::new(resolve_relative_to_db(&db_path, &summary_path)),
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let execution_api = Arc::new(ExecutionApi::new(
            conn.clone(),
            aggregator,
            rng_factory,
            execution_repo.clone(),
        ));
        let statistics_api = Arc::new(StatisticsApi::new(
            statistics,
            execution_repo,
            ledger_repo,
            process_repo.clone(),
        ));
        let config_api = Arc::new(ConfigApi::new(
            config_manager,
            gate,
            summary_service,
            activity_log_repo.clone(),
        ));
        let catalog_api = Arc::new(CatalogApi::new(process_repo, material_repo, indicator_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            execution_api,
            statistics_api,
            config_api,
            catalog_api,
            activity_log_repo,
        })
    }
}

/// 相对路径按数据库文件所在目录解析
fn resolve_relative_to_db(db_path: &str, path: &str) -> PathBuf {
    let candidate = PathBuf::from(path);
    if candidate.is_absolute() {
        return candidate;
    }
    match Path::new(db_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(candidate),
        _ => candidate,
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("PROCESS_CONFORMITY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./process_conformity.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("process-conformity");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("process_conformity.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_resolve_relative_to_db() {
        assert_eq!(
            resolve_relative_to_db("/var/lib/pc/app.db", "data/resumen_dia.json"),
            PathBuf::from("/var/lib/pc/data/resumen_dia.json")
        );
        assert_eq!(
            resolve_relative_to_db("/var/lib/pc/app.db", "/tmp/resumen.json"),
            PathBuf::from("/tmp/resumen.json")
        );
        assert_eq!(
            resolve_relative_to_db("app.db", "data/resumen_dia.json"),
            PathBuf::from("data/resumen_dia.json")
        );
    }
}
