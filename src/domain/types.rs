// ==========================================
// 工序执行质量追踪系统 - 领域类型定义
// ==========================================
// 职责: 目录实体类型、日志类别、调用方角色
// 序列化格式: 与数据库存储字符串一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 数值类型 (Value Kind)
// ==========================================
// 用途: 物料(输入/输出)的计量方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,   // 整数计量
    Float, // 连续计量
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
        }
    }
}

impl ValueKind {
    /// 从数据库字符串解析（未知值按 float 处理）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "int" => ValueKind::Int,
            _ => ValueKind::Float,
        }
    }
}

// ==========================================
// 指标类型 (Indicator Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Range,    // 数值区间
    Checkbox, // 布尔检查
    Criteria, // 百分比/绝对值判据
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Range => write!(f, "range"),
            IndicatorKind::Checkbox => write!(f, "checkbox"),
            IndicatorKind::Criteria => write!(f, "criteria"),
        }
    }
}

impl IndicatorKind {
    /// 从数据库字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "range" => Some(IndicatorKind::Range),
            "checkbox" => Some(IndicatorKind::Checkbox),
            "criteria" => Some(IndicatorKind::Criteria),
            _ => None,
        }
    }
}

// ==========================================
// 活动日志类别 (Activity Kind)
// ==========================================
// 用途: 每日汇总按类别计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Process,   // 工艺流程定义
    Material,  // 输入/输出物料定义
    Indicator, // 指标定义
    Execution, // 流程执行
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Process => "PROCESS",
            ActivityKind::Material => "MATERIAL",
            ActivityKind::Indicator => "INDICATOR",
            ActivityKind::Execution => "EXECUTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PROCESS" => Some(ActivityKind::Process),
            "MATERIAL" => Some(ActivityKind::Material),
            "INDICATOR" => Some(ActivityKind::Indicator),
            "EXECUTION" => Some(ActivityKind::Execution),
            _ => None,
        }
    }
}

// ==========================================
// 调用方角色 (Caller Role)
// ==========================================
// 令牌签发/校验在外部完成，这里只接收已解析的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerRole {
    Admin,
    Operator,
}

/// 已认证的调用方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: i64,
    pub email: String,
    pub role: CallerRole,
}

impl Caller {
    /// 本地命令行操作人（actor_id = 0）
    pub fn system() -> Self {
        Self {
            id: 0,
            email: "system@localhost".to_string(),
            role: CallerRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == CallerRole::Admin
    }
}
