// ==========================================
// 工序执行质量追踪系统 - 活动日志数据仓储
// ==========================================
// 用途: 审计追踪，每日汇总计数
// 红线: 目录实体创建与流程执行必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActivityLogRepository;
