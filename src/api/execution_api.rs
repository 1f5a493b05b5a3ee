// ==========================================
// 工序执行质量追踪系统 - 流程执行 API
// ==========================================
// 职责: 流程执行（单事务）、阶段预览、执行记录查询
// 红线: 执行失败整体回滚，不暴露部分结果
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::execution::{ExecutionRecord, ExecutionRequest, ExecutionSummary};
use crate::domain::stage::{Stage, StageRecord, StageResult};
use crate::domain::types::Caller;
use crate::engine::execution::ExecutionAggregator;
use crate::engine::random::RandomSourceFactory;
use crate::repository::error::RepositoryError;
use crate::repository::execution_repo::{ExecutionRepository, SqliteExecutionStore};
use crate::repository::material_ledger_repo::SqliteMaterialLedger;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

// ==========================================
// 响应 DTO
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub message: String,
    pub id_proceso_ejecutado: i64,
    pub conformes: i64,
    pub no_conformes: i64,
    pub num_etapas_con_conformidades: i64,
    pub tasa_de_exito: f64,
    pub etapas: Vec<StageRecord>,
}

impl From<ExecutionRecord> for ExecutionResponse {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            message: "Proceso ejecutado exitosamente".to_string(),
            id_proceso_ejecutado: record.id_proceso_ejecutado,
            conformes: record.conformes,
            no_conformes: record.no_conformes,
            num_etapas_con_conformidades: record.num_etapas_con_conformidades,
            tasa_de_exito: record.tasa_de_exito,
            etapas: record.etapas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub preview: StageResult,
}

// ==========================================
// ExecutionApi - 流程执行 API
// ==========================================
pub struct ExecutionApi {
    conn: Arc<Mutex<Connection>>,
    aggregator: ExecutionAggregator,
    rng_factory: RandomSourceFactory,
    execution_repo: Arc<ExecutionRepository>,
}

impl ExecutionApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        aggregator: ExecutionAggregator,
        rng_factory: RandomSourceFactory,
        execution_repo: Arc<ExecutionRepository>,
    ) -> Self {
        Self {
            conn,
            aggregator,
            rng_factory,
            execution_repo,
        }
    }

    /// 执行流程
    ///
    /// # 流程
    /// 1. 校验输入读数
    /// 2. 开启 IMMEDIATE 事务（并发执行串行化，台账增量不丢失）
    /// 3. 引擎执行（台账、汇总、历史、活动日志均写入同一事务）
    /// 4. 提交；任一步骤失败时事务 drop 回滚
    #[instrument(skip(self, request, caller), fields(id_proceso = request.id_proceso, actor = caller.id))]
    pub fn execute(&self, request: &ExecutionRequest, caller: &Caller) -> ApiResult<ExecutionResponse> {
        for stage in &request.etapas {
            validate_stage(stage)?;
        }

        let mut rng = self.rng_factory.create();

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::from(RepositoryError::LockError(e.to_string())))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| ApiError::TransactionError(format!("开启事务失败: {}", e)))?;

        let record = {
            let store = SqliteExecutionStore::new(&tx, caller.id);
            let ledger = SqliteMaterialLedger::new(&tx);
            match self.aggregator.execute(request, &store, &ledger, rng.as_mut()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "流程执行失败，事务回滚");
                    return Err(e.into());
                }
            }
        };

        tx.commit()
            .map_err(|e| ApiError::TransactionError(format!("提交事务失败: {}", e)))?;

        info!(
            execution_id = record.id_proceso_ejecutado,
            tasa_de_exito = record.tasa_de_exito,
            "流程执行已提交"
        );
        Ok(record.into())
    }

    /// 预览单个阶段（无副作用）
    pub fn preview(&self, stage: &Stage) -> ApiResult<PreviewResponse> {
        validate_stage(stage)?;
        let mut rng = self.rng_factory.create();
        let preview = self.aggregator.processor().process(stage, rng.as_mut())?;
        Ok(PreviewResponse { preview })
    }

    /// 查询完整执行记录
    pub fn get_execution(&self, execution_id: i64) -> ApiResult<ExecutionRecord> {
        self.execution_repo
            .find_record(execution_id)?
            .ok_or_else(|| ApiError::NotFound(format!("执行记录(id={})不存在", execution_id)))
    }

    /// 查询全部执行历史
    pub fn list_history(&self) -> ApiResult<Vec<ExecutionRecord>> {
        Ok(self.execution_repo.list_history()?)
    }

    /// 查询执行汇总行（proceso_ejecutado）
    pub fn get_execution_summary(&self, execution_id: i64) -> ApiResult<ExecutionSummary> {
        self.execution_repo
            .find_summary(execution_id)?
            .ok_or_else(|| ApiError::NotFound(format!("执行记录(id={})不存在", execution_id)))
    }

    /// 查询某流程的全部执行汇总（按执行ID升序）
    pub fn list_process_executions(&self, id_proceso: i64) -> ApiResult<Vec<ExecutionSummary>> {
        Ok(self.execution_repo.list_summaries_by_process(id_proceso)?)
    }
}

/// 输入/输出读数必须为有限非负数（台账只累加）
fn validate_stage(stage: &Stage) -> ApiResult<()> {
    let readings = stage
        .entradas
        .iter()
        .map(|e| ("输入", e.id, e.value))
        .chain(stage.salidas.iter().map(|s| ("输出", s.id, s.value)));
    for (label, id, value) in readings {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "阶段{}{}{}的数值无效: {}",
                stage.num_etapa, label, id, value
            )));
        }
    }
    Ok(())
}
