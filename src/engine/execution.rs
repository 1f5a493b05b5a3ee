// ==========================================
// 工序执行质量追踪系统 - 执行聚合器
// ==========================================
// 职责: 按顺序处理一次流程执行的全部阶段，累计合格/不合格总量，
//       计算成功率，更新物料台账并组装执行记录
// 红线: Engine 不拼 SQL，持久化通过协作方 Trait 完成
// 红线: 执行总量 = 各阶段总量之和
// ==========================================

use crate::domain::execution::{
    success_rate, ExecutionRecord, ExecutionRequest, ExecutionShell, ExecutionTotals,
};
use crate::domain::stage::{EntradaReading, SalidaReading, StageRecord};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::random::RandomSource;
use crate::engine::stage::StageProcessor;
use crate::repository::error::RepositoryResult;
use tracing::{info, instrument};

// ==========================================
// 协作方 Trait
// ==========================================

/// 物料台账
///
/// 只累加不删除；每次更新对单个物料ID原子生效
pub trait MaterialLedger {
    /// 不存在时创建零值台账（幂等）
    fn ensure(&self, material_id: i64) -> RepositoryResult<()>;

    /// 接收量 += amount，使用次数 += 1
    fn record_receipt(&self, material_id: i64, amount: f64) -> RepositoryResult<()>;

    /// 发出量 += amount，使用次数 += 1
    fn record_dispatch(&self, material_id: i64, amount: f64) -> RepositoryResult<()>;
}

/// 执行记录存储
pub trait ExecutionStore {
    /// 创建执行记录初始行，返回执行ID
    fn create_shell(&self, shell: &ExecutionShell) -> RepositoryResult<i64>;

    /// 写入最终汇总
    fn finalize(&self, execution_id: i64, totals: &ExecutionTotals) -> RepositoryResult<()>;

    /// 追加执行历史
    fn append_history(&self, record: &ExecutionRecord) -> RepositoryResult<()>;

    /// 写入执行活动日志
    fn log_activity(&self, execution_id: i64, description: &str) -> RepositoryResult<()>;
}

// ==========================================
// ExecutionAggregator - 执行聚合器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionAggregator {
    processor: StageProcessor,
}

impl ExecutionAggregator {
    pub fn new(processor: StageProcessor) -> Self {
        Self { processor }
    }

    pub fn processor(&self) -> &StageProcessor {
        &self.processor
    }

    /// 执行一次流程
    ///
    /// # 步骤
    /// 1. 计算输入总量
    /// 2. 创建执行记录初始行，获取执行ID
    /// 3. 逐阶段处理，累计总量，更新台账（输入=接收，输出=发出）
    /// 4. 计算成功率
    /// 5. 写入汇总、历史、活动日志
    ///
    /// 任一步骤失败立即返回错误，由调用方回滚事务
    #[instrument(skip_all, fields(id_proceso = request.id_proceso, etapas = request.etapas.len()))]
    pub fn execute(
        &self,
        request: &ExecutionRequest,
        store: &dyn ExecutionStore,
        ledger: &dyn MaterialLedger,
        rng: &mut dyn RandomSource,
    ) -> EngineResult<ExecutionRecord> {
        let cantidad_entrada = request.cantidad_entrada();

        let execution_id = store
            .create_shell(&ExecutionShell {
                id_proceso: request.id_proceso,
                cantidad_entrada,
            })
            .map_err(EngineError::Store)?;

        let mut total_conformes: i64 = 0;
        let mut total_no_conformes: i64 = 0;
        let mut num_etapas_con_conformidades: i64 = 0;
        let mut etapas = Vec::with_capacity(request.etapas.len());

        for stage in &request.etapas {
            let result = self.processor.process(stage, rng)?;

            total_conformes += result.conformes;
            total_no_conformes += result.no_conformes;
            if result.conformes > 0 {
                num_etapas_con_conformidades += 1;
            }

            record_receipts(ledger, &result.entradas)?;
            record_dispatches(ledger, &result.salidas)?;

            etapas.push(StageRecord::from_result(stage.num_etapa, result));
        }

        let tasa_de_exito = success_rate(total_conformes, total_no_conformes);

        let totals = ExecutionTotals {
            conformidades: total_conformes,
            no_conformidades: total_no_conformes,
            num_etapas_con_conformidades,
            tasa_de_exito,
            cantidad_salida: total_conformes as f64,
        };
        store
            .finalize(execution_id, &totals)
            .map_err(EngineError::Store)?;

        let record = ExecutionRecord {
            id_proceso: request.id_proceso,
            id_proceso_ejecutado: execution_id,
            num_etapas: request.etapas.len(),
            cantidad_entrada,
            conformes: total_conformes,
            no_conformes: total_no_conformes,
            num_etapas_con_conformidades,
            tasa_de_exito,
            etapas,
            created_at: chrono::Utc::now().naive_utc(),
        };
        store.append_history(&record).map_err(EngineError::Store)?;

        let description = format!(
            "Ejecución ID {} de proceso ID {} con {} etapas.",
            execution_id,
            request.id_proceso,
            request.etapas.len()
        );
        store
            .log_activity(execution_id, &description)
            .map_err(EngineError::Store)?;

        info!(
            execution_id,
            conformes = total_conformes,
            no_conformes = total_no_conformes,
            tasa_de_exito,
            "流程执行完成"
        );

        Ok(record)
    }
}

fn record_receipts(ledger: &dyn MaterialLedger, entradas: &[EntradaReading]) -> EngineResult<()> {
    for entrada in entradas {
        ledger.ensure(entrada.id).map_err(EngineError::Ledger)?;
        ledger
            .record_receipt(entrada.id, entrada.value)
            .map_err(EngineError::Ledger)?;
    }
    Ok(())
}

fn record_dispatches(ledger: &dyn MaterialLedger, salidas: &[SalidaReading]) -> EngineResult<()> {
    for salida in salidas {
        ledger.ensure(salida.id).map_err(EngineError::Ledger)?;
        ledger
            .record_dispatch(salida.id, salida.value)
            .map_err(EngineError::Ledger)?;
    }
    Ok(())
}
