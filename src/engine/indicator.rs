// ==========================================
// 工序执行质量追踪系统 - 指标评估器
// ==========================================
// 职责: (输入量, 指标规则) → (不合格量, 是否触发)
// 规则: 复选框/判据/区间三类字段全部累加，互不排斥
// 红线: 不合格量恒 >= 0
// ==========================================

use crate::domain::stage::{Criterion, IndicatorRule, RuleCheck};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::random::RandomSource;

/// 复选框未通过时的随机不合格量上限比例（相对输入量）
pub const DEFAULT_CHECKBOX_PENALTY_RATIO: f64 = 0.1;

/// 单条指标评估结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorOutcome {
    pub non_conformity: f64,
    pub affected: bool,
}

impl IndicatorOutcome {
    pub const NONE: IndicatorOutcome = IndicatorOutcome {
        non_conformity: 0.0,
        affected: false,
    };
}

// ==========================================
// IndicatorEvaluator - 指标评估器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEvaluator {
    checkbox_penalty_ratio: f64,
}

impl Default for IndicatorEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKBOX_PENALTY_RATIO)
    }
}

impl IndicatorEvaluator {
    /// 创建评估器
    ///
    /// # 参数
    /// - checkbox_penalty_ratio: 复选框随机不合格量上限比例，非法值回退为默认 0.1
    pub fn new(checkbox_penalty_ratio: f64) -> Self {
        let ratio = if checkbox_penalty_ratio.is_finite() && checkbox_penalty_ratio >= 0.0 {
            checkbox_penalty_ratio
        } else {
            DEFAULT_CHECKBOX_PENALTY_RATIO
        };
        Self {
            checkbox_penalty_ratio: ratio,
        }
    }

    pub fn checkbox_penalty_ratio(&self) -> f64 {
        self.checkbox_penalty_ratio
    }

    /// 评估单条指标
    ///
    /// # 返回
    /// - Ok(IndicatorOutcome): 不合格量与触发标志
    /// - Err(EngineError::InvalidCriteria / InvalidRange): 规则字段格式错误
    pub fn evaluate(
        &self,
        input_value: f64,
        rule: &IndicatorRule,
        rng: &mut dyn RandomSource,
    ) -> EngineResult<IndicatorOutcome> {
        let checks = parse_rule_checks(rule)?;
        Ok(self.evaluate_checks(input_value, &checks, rng))
    }

    /// 评估已解析的规则列表（累加）
    pub fn evaluate_checks(
        &self,
        input_value: f64,
        checks: &[RuleCheck],
        rng: &mut dyn RandomSource,
    ) -> IndicatorOutcome {
        let mut outcome = IndicatorOutcome::NONE;

        for check in checks {
            match *check {
                RuleCheck::BooleanCheck(passed) => {
                    if !passed {
                        outcome.non_conformity +=
                            rng.uniform(input_value * self.checkbox_penalty_ratio);
                        outcome.affected = true;
                    }
                }
                RuleCheck::Criteria(Criterion::Percentage(p)) => {
                    outcome.non_conformity += input_value * (p / 100.0);
                    outcome.affected = true;
                }
                RuleCheck::Criteria(Criterion::Absolute(amount)) => {
                    outcome.non_conformity += amount;
                    outcome.affected = true;
                }
                RuleCheck::Range { min, max } => {
                    if input_value < min || input_value > max {
                        outcome.non_conformity += (input_value - input_value.clamp(min, max)).abs();
                        outcome.affected = true;
                    }
                }
            }
        }

        outcome
    }
}

// ==========================================
// 规则解析
// ==========================================

/// 将指标记录解析为有序规则列表 (复选框 → 判据 → 区间)
///
/// 空字符串视为字段缺失
pub fn parse_rule_checks(rule: &IndicatorRule) -> EngineResult<Vec<RuleCheck>> {
    let mut checks = Vec::with_capacity(3);

    if let Some(passed) = rule.checkbox {
        checks.push(RuleCheck::BooleanCheck(passed));
    }

    if let Some(raw) = rule.criteria.as_deref() {
        if !raw.trim().is_empty() {
            checks.push(RuleCheck::Criteria(parse_criterion(rule.id, raw)?));
        }
    }

    if let Some(raw) = rule.range.as_deref() {
        if !raw.trim().is_empty() {
            let (min, max) = parse_range(rule.id, raw)?;
            checks.push(RuleCheck::Range { min, max });
        }
    }

    Ok(checks)
}

/// 解析判据: "12.5%" → 百分比，"3" → 绝对量
pub fn parse_criterion(indicator_id: i64, raw: &str) -> EngineResult<Criterion> {
    let invalid = || EngineError::InvalidCriteria {
        indicator_id,
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    let (number, is_percentage) = if trimmed.contains('%') {
        (trimmed.trim_matches('%').trim(), true)
    } else {
        (trimmed, false)
    };

    let value: f64 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok(if is_percentage {
        Criterion::Percentage(value)
    } else {
        Criterion::Absolute(value)
    })
}

/// 解析区间: "80-120" → (80, 120)
///
/// 分隔符为首字符之后的第一个 '-'，允许负下限（如 "-5-10"）
pub fn parse_range(indicator_id: i64, raw: &str) -> EngineResult<(f64, f64)> {
    let invalid = || EngineError::InvalidRange {
        indicator_id,
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    let split_at = trimmed
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '-')
        .map(|(idx, _)| idx)
        .ok_or_else(invalid)?;

    let min: f64 = trimmed[..split_at].trim().parse().map_err(|_| invalid())?;
    let max: f64 = trimmed[split_at + 1..].trim().parse().map_err(|_| invalid())?;

    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(invalid());
    }

    Ok((min, max))
}
