// ==========================================
// 工序执行质量追踪系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 日志统一写 stderr，stdout 只输出命令结果 JSON
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量（取值 `json` 时输出结构化日志）
pub const LOG_FORMAT_ENV: &str = "PROCESS_CONFORMITY_LOG_FORMAT";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn wants_json() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=process_conformity::engine=trace
/// - PROCESS_CONFORMITY_LOG_FORMAT: `json` 输出结构化日志，其余为文本
///
/// # 示例
/// ```no_run
/// use process_conformity::logging;
/// logging::init();
/// ```
pub fn init() {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    // 重复初始化时忽略（测试/嵌入场景）
    let _ = if wants_json() {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
}

/// 初始化测试环境的日志系统
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("process_conformity=debug"))
        .with_test_writer()
        .try_init();
}
