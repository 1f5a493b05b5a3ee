// ==========================================
// 工序执行质量追踪系统 - 流程执行领域模型
// ==========================================
// 职责: 执行请求、执行记录(历史)、执行汇总行
// 红线: 执行记录在请求完成后不可变
// ==========================================

use crate::domain::stage::{Stage, StageRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ExecutionRequest - 执行请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub id_proceso: i64,
    pub etapas: Vec<Stage>, // 有序阶段
}

impl ExecutionRequest {
    /// 全部阶段的输入总量（仅记录用途）
    pub fn cantidad_entrada(&self) -> f64 {
        self.etapas.iter().map(Stage::input_total).sum()
    }
}

// ==========================================
// ExecutionRecord - 执行历史记录
// ==========================================
// 追加写入 execution_history，统计层只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id_proceso: i64,
    pub id_proceso_ejecutado: i64,
    pub num_etapas: usize,
    pub cantidad_entrada: f64,
    pub conformes: i64,
    pub no_conformes: i64,
    pub num_etapas_con_conformidades: i64,
    pub tasa_de_exito: f64, // 百分比 [0, 100]
    pub etapas: Vec<StageRecord>,
    pub created_at: NaiveDateTime,
}

impl ExecutionRecord {
    /// 成功比例 (0..1)，无数据时为 0
    pub fn success_fraction(&self) -> f64 {
        success_fraction(self.conformes, self.no_conformes)
    }
}

/// 成功比例 (0..1)
pub fn success_fraction(conformes: i64, no_conformes: i64) -> f64 {
    let total = conformes + no_conformes;
    if total > 0 {
        conformes as f64 / total as f64
    } else {
        0.0
    }
}

/// 成功率 (百分比 0..100)
pub fn success_rate(conformes: i64, no_conformes: i64) -> f64 {
    success_fraction(conformes, no_conformes) * 100.0
}

// ==========================================
// ExecutionShell - 执行记录初始行
// ==========================================
// 阶段处理前创建，用于获取执行ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionShell {
    pub id_proceso: i64,
    pub cantidad_entrada: f64,
}

// ==========================================
// ExecutionTotals - 执行完成后的汇总数据
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTotals {
    pub conformidades: i64,
    pub no_conformidades: i64,
    pub num_etapas_con_conformidades: i64,
    pub tasa_de_exito: f64,
    pub cantidad_salida: f64,
}

// ==========================================
// ExecutionSummary - proceso_ejecutado 表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub id: i64,
    pub id_proceso: i64,
    pub num_etapas_con_conformidades: i64,
    pub tasa_de_exito: f64,
    pub no_conformidades: i64,
    pub conformidades: i64,
    pub cantidad_entrada: f64,
    pub cantidad_salida: f64,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_zero_denominator() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_fraction(0, 0), 0.0);
    }

    #[test]
    fn test_success_rate_scenario() {
        assert_eq!(success_rate(70, 10), 87.5);
        assert_eq!(success_rate(0, 10), 0.0);
        assert_eq!(success_rate(10, 0), 100.0);
    }
}
