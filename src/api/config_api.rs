// ==========================================
// 工序执行质量追踪系统 - 配置管理 API
// ==========================================
// 职责: 可用时段配置与查询、每日汇总生成与读取、通用配置项
// 权限: 写操作仅限管理员
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::types::Caller;
use crate::engine::availability::{AvailabilityGate, AvailabilityStatus};
use crate::engine::daily_summary::{DailySummary, DailySummaryService};
use crate::repository::activity_log_repo::ActivityLogRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ==========================================
// 响应 DTO
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleUpdateResponse {
    pub message: String,
    pub hora_inicio: u32,
    pub duracion_horas: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSummaryResponse {
    pub message: String,
    pub resumen: DailySummary,
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
    gate: Arc<AvailabilityGate>,
    summary_service: DailySummaryService,
    activity_repo: Arc<ActivityLogRepository>,
}

impl ConfigApi {
    pub fn new(
        config_manager: Arc<ConfigManager>,
        gate: Arc<AvailabilityGate>,
        summary_service: DailySummaryService,
        activity_repo: Arc<ActivityLogRepository>,
    ) -> Self {
        Self {
            config_manager,
            gate,
            summary_service,
            activity_repo,
        }
    }

    fn require_admin(caller: &Caller) -> ApiResult<()> {
        if !caller.is_admin() {
            warn!(caller_id = caller.id, "非管理员尝试执行管理操作");
            return Err(ApiError::Forbidden(
                "User does not have admin privileges".to_string(),
            ));
        }
        Ok(())
    }

    // ==========================================
    // 可用时段
    // ==========================================

    /// 更新可用时段
    ///
    /// 先校验并持久化，再替换内存中的时段；校验失败不改变任何状态
    #[instrument(skip(self, caller), fields(caller_id = caller.id))]
    pub fn update_schedule(
        &self,
        caller: &Caller,
        start_hour: u32,
        duration_hours: u32,
    ) -> ApiResult<ScheduleUpdateResponse> {
        Self::require_admin(caller)?;

        let schedule = self
            .config_manager
            .save_availability_schedule(start_hour, duration_hours)?;
        self.gate.update(schedule);

        Ok(ScheduleUpdateResponse {
            message: "Horario de disponibilidad actualizado".to_string(),
            hora_inicio: schedule.start_hour,
            duracion_horas: schedule.duration_hours,
        })
    }

    /// 查询可用状态
    pub fn availability(&self, now: DateTime<Utc>) -> AvailabilityStatus {
        self.gate.status(now)
    }

    // ==========================================
    // 每日汇总
    // ==========================================

    /// 生成每日汇总（写缓存文件）
    #[instrument(skip(self, caller), fields(caller_id = caller.id))]
    pub fn generate_daily_summary(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> ApiResult<GenerateSummaryResponse> {
        Self::require_admin(caller)?;

        let resumen = self
            .summary_service
            .generate(now, self.activity_repo.as_ref())?;
        info!(path = %self.summary_service.cache().path().display(), "每日汇总已写入缓存");

        Ok(GenerateSummaryResponse {
            message: "Resumen generado exitosamente".to_string(),
            resumen,
        })
    }

    /// 读取每日汇总缓存
    ///
    /// # 错误
    /// - Unavailable: 系统处于可用时段
    /// - NotFound: 尚未生成缓存文件
    pub fn get_daily_summary(&self, now: DateTime<Utc>) -> ApiResult<DailySummary> {
        if self.gate.is_available(now) {
            return Err(ApiError::Unavailable(
                "El sistema está disponible; no se puede ver el resumen ahora.".to_string(),
            ));
        }

        self.summary_service.read_cached()?.ok_or_else(|| {
            ApiError::NotFound("Resumen no disponible; no se ha generado el archivo.".to_string())
        })
    }

    // ==========================================
    // 通用配置项
    // ==========================================

    pub fn get_config_value(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.config_manager.get_global_config_value(key)?)
    }

    pub fn set_config_value(&self, caller: &Caller, key: &str, value: &str) -> ApiResult<()> {
        Self::require_admin(caller)?;
        if key.trim().is_empty() {
            return Err(ApiError::ValidationError("配置键不能为空".to_string()));
        }
        self.config_manager.set_global_config_value(key, value)?;
        info!(key, value, caller_id = caller.id, "配置已更新");
        Ok(())
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }
}
