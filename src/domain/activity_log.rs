// ==========================================
// 工序执行质量追踪系统 - 活动日志领域模型
// ==========================================
// 用途: 审计追踪，每日汇总计数
// ==========================================

use crate::domain::types::ActivityKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ActivityLog - 活动日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub activity_id: String,      // UUID
    pub kind: ActivityKind,       // 日志类别
    pub ref_id: i64,              // 关联实体ID（流程/物料/指标/执行）
    pub actor_id: i64,            // 操作人ID (系统操作为 0)
    pub description: String,      // 描述
    pub created_at: NaiveDateTime,
}

impl ActivityLog {
    /// 创建新日志（生成ID，时间为当前 UTC）
    pub fn new(kind: ActivityKind, ref_id: i64, actor_id: i64, description: String) -> Self {
        Self {
            activity_id: uuid::Uuid::new_v4().to_string(),
            kind,
            ref_id,
            actor_id,
            description,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
