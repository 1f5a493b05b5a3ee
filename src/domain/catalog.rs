// ==========================================
// 工序执行质量追踪系统 - 流程目录领域模型
// ==========================================
// 职责: 工艺流程、物料、指标的定义数据
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::types::{IndicatorKind, ValueKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ProcessDefinition - 工艺流程定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub num_etapas: i64,
}

/// 新建流程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProcess {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub num_etapas: i64,
}

// ==========================================
// MaterialDefinition - 物料定义（输入/输出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub id: i64,
    pub nombre: String,
    pub tipo: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub nombre: String,
    pub tipo: ValueKind,
}

// ==========================================
// IndicatorDefinition - 指标定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub id: i64,
    pub nombre: String,
    pub tipo: IndicatorKind,
    pub entrada_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIndicator {
    pub nombre: String,
    pub tipo: IndicatorKind,
    pub entrada_id: i64,
}
