// ==========================================
// 工序执行质量追踪系统 - 统计聚合器
// ==========================================
// 职责: 将执行历史(只读)归约为报表数据
// - 物料台账快照
// - 全局合格/不合格总量
// - 按阶段编号的合格/不合格总量
// - 流程成功率排名（低于/不低于 50%）
// ==========================================

use crate::domain::execution::ExecutionRecord;
use crate::domain::material::NamedLedgerEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 成功率分组阈值（比例）
pub const SUCCESS_THRESHOLD: f64 = 0.5;

/// 默认统计的阶段编号
pub const DEFAULT_STAGE_NUMBERS: [i64; 5] = [0, 1, 2, 3, 4];

// ==========================================
// 报表数据结构
// ==========================================

/// 物料输入/输出状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialStateRow {
    pub id: i64,
    pub nombre: String,
    pub cantidad_entrada: f64,
    pub cantidad_salida: f64,
    pub usos: i64,
}

/// 不合格分布图（全局）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NonConformityDiagram {
    pub conformes: i64,
    pub no_conformes: i64,
}

/// 阶段总体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOverviewRow {
    pub num_etapa: i64,
    pub conformes: i64,
    pub no_conformes: i64,
}

/// 流程平均成功率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSuccess {
    pub id_proceso: i64,
    pub nombre: String,
    pub exito_promedio: f64, // 0..1
}

/// 流程成功率排名
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessSuccessRanking {
    pub procesos_menos_exito: Vec<ProcessSuccess>,
    pub procesos_mayor_exito: Vec<ProcessSuccess>,
}

/// 统计总报表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub estado_entradas_salidas: Vec<MaterialStateRow>,
    pub diagrama_no_conformidades: NonConformityDiagram,
    pub estado_general_etapas: Vec<StageOverviewRow>,
    pub procesos_menos_exito: Vec<ProcessSuccess>,
    pub procesos_mayor_exito: Vec<ProcessSuccess>,
}

// ==========================================
// StatisticsAggregator - 统计聚合器
// ==========================================
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    stage_numbers: Vec<i64>,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_STAGE_NUMBERS.to_vec())
    }
}

impl StatisticsAggregator {
    pub fn new(stage_numbers: Vec<i64>) -> Self {
        Self { stage_numbers }
    }

    pub fn stage_numbers(&self) -> &[i64] {
        &self.stage_numbers
    }

    /// 物料台账快照
    ///
    /// 物料目录中没有名称的台账不出现在结果中
    pub fn material_states(&self, entries: &[NamedLedgerEntry]) -> Vec<MaterialStateRow> {
        entries
            .iter()
            .filter_map(|named| {
                let nombre = named.nombre.clone()?;
                Some(MaterialStateRow {
                    id: named.entry.material_id,
                    nombre,
                    cantidad_entrada: named.entry.cantidad_entrada,
                    cantidad_salida: named.entry.cantidad_salida,
                    usos: named.entry.usos,
                })
            })
            .collect()
    }

    /// 全局合格/不合格总量
    pub fn nonconformity_diagram(&self, history: &[ExecutionRecord]) -> NonConformityDiagram {
        history
            .iter()
            .fold(NonConformityDiagram::default(), |mut acc, record| {
                acc.conformes += record.conformes;
                acc.no_conformes += record.no_conformes;
                acc
            })
    }

    /// 按阶段编号汇总
    ///
    /// 只统计配置的阶段编号，其余编号忽略
    pub fn stage_overview(&self, history: &[ExecutionRecord]) -> Vec<StageOverviewRow> {
        let mut totals: HashMap<i64, (i64, i64)> = HashMap::new();
        for etapa in history.iter().flat_map(|r| r.etapas.iter()) {
            let slot = totals.entry(etapa.num_etapa).or_insert((0, 0));
            slot.0 += etapa.conformes;
            slot.1 += etapa.no_conformes;
        }

        self.stage_numbers
            .iter()
            .map(|&num_etapa| {
                let (conformes, no_conformes) = totals.get(&num_etapa).copied().unwrap_or((0, 0));
                StageOverviewRow {
                    num_etapa,
                    conformes,
                    no_conformes,
                }
            })
            .collect()
    }

    /// 流程成功率排名
    ///
    /// 平均成功率 = 各次执行成功比例的算术平均（不按数量加权）。
    /// 名称无法解析的流程两组都不出现。
    pub fn process_success_ranking(
        &self,
        history: &[ExecutionRecord],
        process_names: &HashMap<i64, String>,
    ) -> ProcessSuccessRanking {
        let mut fractions: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for record in history {
            fractions
                .entry(record.id_proceso)
                .or_default()
                .push(record.success_fraction());
        }

        let mut ranking = ProcessSuccessRanking::default();
        for (id_proceso, values) in fractions {
            let exito_promedio = values.iter().sum::<f64>() / values.len() as f64;

            let nombre = match process_names.get(&id_proceso) {
                Some(n) => n.clone(),
                None => {
                    debug!(id_proceso, "流程名称不存在，排名中忽略");
                    continue;
                }
            };

            let entry = ProcessSuccess {
                id_proceso,
                nombre,
                exito_promedio,
            };
            if exito_promedio < SUCCESS_THRESHOLD {
                ranking.procesos_menos_exito.push(entry);
            } else {
                ranking.procesos_mayor_exito.push(entry);
            }
        }

        ranking
    }

    /// 组装总报表
    pub fn report(
        &self,
        history: &[ExecutionRecord],
        ledger: &[NamedLedgerEntry],
        process_names: &HashMap<i64, String>,
    ) -> StatisticsReport {
        let ranking = self.process_success_ranking(history, process_names);
        StatisticsReport {
            estado_entradas_salidas: self.material_states(ledger),
            diagrama_no_conformidades: self.nonconformity_diagram(history),
            estado_general_etapas: self.stage_overview(history),
            procesos_menos_exito: ranking.procesos_menos_exito,
            procesos_mayor_exito: ranking.procesos_mayor_exito,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::material::MaterialLedgerEntry;
    use crate::domain::stage::StageRecord;

    fn stage_record(num_etapa: i64, conformes: i64, no_conformes: i64) -> StageRecord {
        StageRecord {
            num_etapa,
            conformes,
            no_conformes,
            state: no_conformes > 0,
            entradas: vec![],
            indicadores: vec![],
            salidas: vec![],
        }
    }

    fn record(id_proceso: i64, etapas: Vec<StageRecord>) -> ExecutionRecord {
        let conformes = etapas.iter().map(|e| e.conformes).sum();
        let no_conformes = etapas.iter().map(|e| e.no_conformes).sum();
        ExecutionRecord {
            id_proceso,
            id_proceso_ejecutado: 0,
            num_etapas: etapas.len(),
            cantidad_entrada: 0.0,
            conformes,
            no_conformes,
            num_etapas_con_conformidades: 0,
            tasa_de_exito: crate::domain::execution::success_rate(conformes, no_conformes),
            etapas,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn names(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(id, n)| (*id, n.to_string())).collect()
    }

    #[test]
    fn test_nonconformity_diagram_sums_history() {
        let history = vec![
            record(1, vec![stage_record(0, 40, 10)]),
            record(2, vec![stage_record(1, 5, 5), stage_record(2, 3, 0)]),
        ];
        let diagram = StatisticsAggregator::default().nonconformity_diagram(&history);
        assert_eq!(diagram.conformes, 48);
        assert_eq!(diagram.no_conformes, 15);
    }

    #[test]
    fn test_stage_overview_fixed_numbers() {
        let history = vec![
            record(1, vec![stage_record(0, 10, 1), stage_record(7, 99, 99)]),
            record(1, vec![stage_record(0, 5, 2), stage_record(3, 4, 4)]),
        ];
        let rows = StatisticsAggregator::default().stage_overview(&history);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], StageOverviewRow { num_etapa: 0, conformes: 15, no_conformes: 3 });
        assert_eq!(rows[1], StageOverviewRow { num_etapa: 1, conformes: 0, no_conformes: 0 });
        assert_eq!(rows[3], StageOverviewRow { num_etapa: 3, conformes: 4, no_conformes: 4 });
    }

    #[test]
    fn test_success_ranking_uses_unweighted_mean() {
        // 流程1: 1.0 与 0.0 两次执行 → 平均 0.5 → 高组
        // 流程2: 0.25 → 低组
        let history = vec![
            record(1, vec![stage_record(0, 1000, 0)]),
            record(1, vec![stage_record(0, 0, 1)]),
            record(2, vec![stage_record(0, 1, 3)]),
        ];
        let ranking = StatisticsAggregator::default()
            .process_success_ranking(&history, &names(&[(1, "Laminado"), (2, "Corte")]));

        assert_eq!(ranking.procesos_mayor_exito.len(), 1);
        assert_eq!(ranking.procesos_mayor_exito[0].id_proceso, 1);
        assert_eq!(ranking.procesos_mayor_exito[0].exito_promedio, 0.5);
        assert_eq!(ranking.procesos_menos_exito.len(), 1);
        assert_eq!(ranking.procesos_menos_exito[0].nombre, "Corte");
        assert_eq!(ranking.procesos_menos_exito[0].exito_promedio, 0.25);
    }

    #[test]
    fn test_process_without_executions_excluded() {
        let history = vec![record(1, vec![stage_record(0, 1, 0)])];
        let ranking = StatisticsAggregator::default()
            .process_success_ranking(&history, &names(&[(1, "A"), (2, "B")]));
        let all: Vec<i64> = ranking
            .procesos_mayor_exito
            .iter()
            .chain(ranking.procesos_menos_exito.iter())
            .map(|p| p.id_proceso)
            .collect();
        assert_eq!(all, vec![1]);
    }

    #[test]
    fn test_process_without_name_excluded() {
        let history = vec![record(9, vec![stage_record(0, 1, 0)])];
        let ranking = StatisticsAggregator::default().process_success_ranking(&history, &names(&[]));
        assert!(ranking.procesos_mayor_exito.is_empty());
        assert!(ranking.procesos_menos_exito.is_empty());
    }

    #[test]
    fn test_material_states_skip_unnamed() {
        let entries = vec![
            NamedLedgerEntry {
                entry: MaterialLedgerEntry {
                    material_id: 1,
                    cantidad_entrada: 10.0,
                    cantidad_salida: 8.0,
                    usos: 2,
                },
                nombre: Some("Acero".to_string()),
            },
            NamedLedgerEntry {
                entry: MaterialLedgerEntry::empty(2),
                nombre: None,
            },
        ];
        let rows = StatisticsAggregator::default().material_states(&entries);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nombre, "Acero");
        assert_eq!(rows[0].usos, 2);
    }
}
