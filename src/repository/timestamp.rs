// ==========================================
// 工序执行质量追踪系统 - 时间戳存储格式
// ==========================================
// 存储: UTC，TEXT "%Y-%m-%d %H:%M:%S"，字典序即时间序
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::Row;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// 读取时间戳列（格式错误作为列转换失败返回）
pub fn read_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
