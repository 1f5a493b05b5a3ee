// ==========================================
// 工序执行质量追踪系统 - 物料台账领域模型
// ==========================================
// 红线: 台账只增不删，按物料ID累加
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// MaterialLedgerEntry - 物料台账
// ==========================================
// 首次引用时惰性创建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLedgerEntry {
    pub material_id: i64,
    pub cantidad_entrada: f64, // 累计接收量
    pub cantidad_salida: f64,  // 累计发出量
    pub usos: i64,             // 引用次数
}

impl MaterialLedgerEntry {
    /// 零值台账
    pub fn empty(material_id: i64) -> Self {
        Self {
            material_id,
            cantidad_entrada: 0.0,
            cantidad_salida: 0.0,
            usos: 0,
        }
    }
}

/// 台账 + 物料名称（名称来自物料目录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLedgerEntry {
    pub entry: MaterialLedgerEntry,
    pub nombre: Option<String>,
}
