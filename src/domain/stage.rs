// ==========================================
// 工序执行质量追踪系统 - 阶段领域模型
// ==========================================
// 职责: 阶段输入/指标/输出读数与阶段评估结果
// 约束: 字段名与外部请求结构保持一致 (entradas/indicadores/salidas)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// EntradaReading - 输入读数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntradaReading {
    pub id: i64,    // 物料ID
    pub value: f64, // 流入数量 (非负)
}

// ==========================================
// SalidaReading - 输出读数
// ==========================================
// value 由阶段处理器覆写为同 ID 输入的合格剩余量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalidaReading {
    pub id: i64,
    #[serde(default)]
    pub value: f64,
}

// ==========================================
// IndicatorRule - 指标规则 (外部请求形态)
// ==========================================
// 一条记录可同时携带多个规则字段，评估时全部累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRule {
    pub id: i64,
    pub entrada_id: i64, // 被评估的输入ID

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>, // "10%" 或 "3.5"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>, // "min-max"

    #[serde(default)]
    pub state: bool, // 本次评估是否发现不合格
}

impl IndicatorRule {
    /// 创建不带任何规则字段的指标
    pub fn new(id: i64, entrada_id: i64) -> Self {
        Self {
            id,
            entrada_id,
            checkbox: None,
            criteria: None,
            range: None,
            state: false,
        }
    }

    pub fn with_checkbox(mut self, passed: bool) -> Self {
        self.checkbox = Some(passed);
        self
    }

    pub fn with_criteria(mut self, criteria: &str) -> Self {
        self.criteria = Some(criteria.to_string());
        self
    }

    pub fn with_range(mut self, range: &str) -> Self {
        self.range = Some(range.to_string());
        self
    }
}

// ==========================================
// RuleCheck - 解析后的规则变体
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    Percentage(f64), // 百分比 (10% → 10.0)
    Absolute(f64),   // 绝对数量
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleCheck {
    BooleanCheck(bool),
    Criteria(Criterion),
    Range { min: f64, max: f64 },
}

// ==========================================
// Stage - 阶段
// ==========================================
// num_etapa 由调用方提供，不要求连续或唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub num_etapa: i64,
    #[serde(default)]
    pub entradas: Vec<EntradaReading>,
    #[serde(default)]
    pub indicadores: Vec<IndicatorRule>,
    #[serde(default)]
    pub salidas: Vec<SalidaReading>,
}

impl Stage {
    /// 阶段输入总量
    pub fn input_total(&self) -> f64 {
        self.entradas.iter().map(|e| e.value).sum()
    }
}

// ==========================================
// StageResult - 阶段评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub conformes: i64,    // 合格总量 (截断取整)
    pub no_conformes: i64, // 不合格总量 (截断取整)
    pub entradas: Vec<EntradaReading>,
    pub indicadores: Vec<IndicatorRule>,
    pub salidas: Vec<SalidaReading>,
}

impl StageResult {
    /// 是否有任一指标被触发
    pub fn any_indicator_affected(&self) -> bool {
        self.indicadores.iter().any(|i| i.state)
    }
}

// ==========================================
// StageRecord - 执行历史中的阶段记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub num_etapa: i64,
    pub conformes: i64,
    pub no_conformes: i64,
    pub state: bool,
    pub entradas: Vec<EntradaReading>,
    pub indicadores: Vec<IndicatorRule>,
    pub salidas: Vec<SalidaReading>,
}

impl StageRecord {
    pub fn from_result(num_etapa: i64, result: StageResult) -> Self {
        let state = result.any_indicator_affected();
        Self {
            num_etapa,
            conformes: result.conformes,
            no_conformes: result.no_conformes,
            state,
            entradas: result.entradas,
            indicadores: result.indicadores,
            salidas: result.salidas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_rule_optional_fields_deserialize() {
        let raw = r#"{"id": 7, "entrada_id": 1, "criteria": "10%"}"#;
        let rule: IndicatorRule = serde_json::from_str(raw).unwrap();
        assert_eq!(rule.id, 7);
        assert_eq!(rule.checkbox, None);
        assert_eq!(rule.criteria.as_deref(), Some("10%"));
        assert!(!rule.state);
    }

    #[test]
    fn test_stage_input_total() {
        let stage = Stage {
            num_etapa: 0,
            entradas: vec![
                EntradaReading { id: 1, value: 10.5 },
                EntradaReading { id: 2, value: 4.5 },
            ],
            indicadores: vec![],
            salidas: vec![],
        };
        assert_eq!(stage.input_total(), 15.0);
    }

    #[test]
    fn test_stage_record_state_from_indicators() {
        let mut affected = IndicatorRule::new(1, 1);
        affected.state = true;
        let result = StageResult {
            conformes: 1,
            no_conformes: 0,
            entradas: vec![],
            indicadores: vec![IndicatorRule::new(2, 1), affected],
            salidas: vec![],
        };
        let record = StageRecord::from_result(3, result);
        assert_eq!(record.num_etapa, 3);
        assert!(record.state);
    }
}
