// ==========================================
// 工序执行质量追踪系统 - 阶段处理器
// ==========================================
// 职责: 对阶段内每个 (输入, 指标) 对调用指标评估器，
//       计算输出合格量并生成阶段汇总
// 红线: 合格剩余量不小于 0；总量仅在阶段级截断取整
// ==========================================

use crate::domain::stage::{Stage, StageResult};
use crate::engine::error::EngineResult;
use crate::engine::indicator::IndicatorEvaluator;
use crate::engine::random::RandomSource;
use tracing::{debug, instrument};

// ==========================================
// StageProcessor - 阶段处理器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct StageProcessor {
    evaluator: IndicatorEvaluator,
}

impl StageProcessor {
    pub fn new(evaluator: IndicatorEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &IndicatorEvaluator {
        &self.evaluator
    }

    /// 处理单个阶段
    ///
    /// 按输入声明顺序：
    /// 1. 累加所有 entrada_id 匹配的指标不合格量，指标各自记录 state
    /// 2. 剩余合格量 = max(0, 输入量 - 不合格量)，不合格量以输入量为上限
    /// 3. 同 ID 输出覆写为剩余合格量
    /// 4. 累加阶段合格/不合格总量
    ///
    /// 无副作用（随机抽样除外）
    #[instrument(skip(self, stage, rng), fields(num_etapa = stage.num_etapa, entradas = stage.entradas.len()))]
    pub fn process(&self, stage: &Stage, rng: &mut dyn RandomSource) -> EngineResult<StageResult> {
        let entradas = stage.entradas.clone();
        let mut indicadores = stage.indicadores.clone();
        let mut salidas = stage.salidas.clone();

        for indicador in indicadores.iter_mut() {
            indicador.state = false;
        }

        let mut total_conformes = 0.0_f64;
        let mut total_no_conformes = 0.0_f64;

        for entrada in &entradas {
            let mut no_conformes = 0.0_f64;

            for indicador in indicadores
                .iter_mut()
                .filter(|i| i.entrada_id == entrada.id)
            {
                let outcome = self.evaluator.evaluate(entrada.value, indicador, rng)?;
                no_conformes += outcome.non_conformity;
                indicador.state = indicador.state || outcome.affected;
            }

            // 不合格量以该输入流入量为上限，保证 合格+不合格 = 输入量（DESIGN.md 开放问题 #4）
            let no_conformes = no_conformes.min(entrada.value.max(0.0));
            let residual = (entrada.value - no_conformes).max(0.0);
            total_no_conformes += no_conformes;
            total_conformes += residual;

            for salida in salidas.iter_mut().filter(|s| s.id == entrada.id) {
                salida.value = residual;
            }

            debug!(
                entrada_id = entrada.id,
                value = entrada.value,
                no_conformes,
                residual,
                "输入评估完成"
            );
        }

        Ok(StageResult {
            conformes: total_conformes.trunc() as i64,
            no_conformes: total_no_conformes.trunc() as i64,
            entradas,
            indicadores,
            salidas,
        })
    }
}
