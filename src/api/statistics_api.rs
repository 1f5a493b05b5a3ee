// ==========================================
// 工序执行质量追踪系统 - 统计 API
// ==========================================
// 职责: 读取执行历史与物料台账，交给统计聚合器归约
// 红线: 只读
// ==========================================

use crate::api::error::ApiResult;
use crate::engine::statistics::{
    MaterialStateRow, NonConformityDiagram, ProcessSuccessRanking, StageOverviewRow,
    StatisticsAggregator, StatisticsReport,
};
use crate::repository::catalog_repo::ProcessDefRepository;
use crate::repository::execution_repo::ExecutionRepository;
use crate::repository::material_ledger_repo::MaterialLedgerRepository;
use std::sync::Arc;
use tracing::instrument;

pub struct StatisticsApi {
    aggregator: StatisticsAggregator,
    execution_repo: Arc<ExecutionRepository>,
    ledger_repo: Arc<MaterialLedgerRepository>,
    process_repo: Arc<ProcessDefRepository>,
}

impl StatisticsApi {
    pub fn new(
        aggregator: StatisticsAggregator,
        execution_repo: Arc<ExecutionRepository>,
        ledger_repo: Arc<MaterialLedgerRepository>,
        process_repo: Arc<ProcessDefRepository>,
    ) -> Self {
        Self {
            aggregator,
            execution_repo,
            ledger_repo,
            process_repo,
        }
    }

    /// 统计总报表
    #[instrument(skip(self))]
    pub fn get_statistics(&self) -> ApiResult<StatisticsReport> {
        let history = self.execution_repo.list_history()?;
        let ledger = self.ledger_repo.list_with_names()?;
        let names = self.process_repo.name_map()?;
        Ok(self.aggregator.report(&history, &ledger, &names))
    }

    pub fn material_states(&self) -> ApiResult<Vec<MaterialStateRow>> {
        let ledger = self.ledger_repo.list_with_names()?;
        Ok(self.aggregator.material_states(&ledger))
    }

    pub fn nonconformity_diagram(&self) -> ApiResult<NonConformityDiagram> {
        let history = self.execution_repo.list_history()?;
        Ok(self.aggregator.nonconformity_diagram(&history))
    }

    pub fn stage_overview(&self) -> ApiResult<Vec<StageOverviewRow>> {
        let history = self.execution_repo.list_history()?;
        Ok(self.aggregator.stage_overview(&history))
    }

    pub fn process_success_ranking(&self) -> ApiResult<ProcessSuccessRanking> {
        let history = self.execution_repo.list_history()?;
        let names = self.process_repo.name_map()?;
        Ok(self.aggregator.process_success_ranking(&history, &names))
    }
}
