// ==========================================
// 工序执行质量追踪系统 - 命令行主入口
// ==========================================
// 职责: 解析命令行参数，调用 API，输出 JSON
// ==========================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use process_conformity::app::{get_default_db_path, AppState};
use process_conformity::domain::{ExecutionRequest, Stage};
use process_conformity::{logging, Caller, CallerRole};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "process-conformity")]
#[command(about = "工序执行质量追踪系统")]
#[command(version)]
struct Args {
    /// 数据库文件路径
    #[arg(long, env = "PROCESS_CONFORMITY_DB_PATH")]
    db_path: Option<String>,

    /// 调用方 ID（写入活动日志）
    #[arg(long, default_value_t = 0)]
    caller_id: i64,

    /// 以操作员身份调用（默认管理员）
    #[arg(long)]
    operator: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 执行流程（请求 JSON 文件）
    Execute { request: PathBuf },
    /// 预览单个阶段（阶段 JSON 文件）
    Preview { stage: PathBuf },
    /// 查询执行记录
    Show { execution_id: i64 },
    /// 列出某流程的执行汇总
    Executions { id_proceso: i64 },
    /// 统计报表
    Stats,
    /// 当前可用状态
    Availability,
    /// 更新可用时段
    Schedule { start_hour: u32, duration_hours: u32 },
    /// 生成每日汇总
    SummaryGenerate,
    /// 读取每日汇总
    Summary,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("JSON 解析失败: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", process_conformity::APP_NAME, process_conformity::VERSION);
    tracing::info!("==================================================");

    let db_path = args.db_path.clone().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let caller = Caller {
        id: args.caller_id,
        email: format!("cli-{}@localhost", args.caller_id),
        role: if args.operator {
            CallerRole::Operator
        } else {
            CallerRole::Admin
        },
    };

    match args.command {
        Command::Execute { request } => {
            let request: ExecutionRequest = read_json(&request)?;
            let api = state.execution_api.clone();
            let response =
                tokio::task::spawn_blocking(move || api.execute(&request, &caller)).await??;
            print_json(&response)
        }
        Command::Preview { stage } => {
            let stage: Stage = read_json(&stage)?;
            print_json(&state.execution_api.preview(&stage)?)
        }
        Command::Show { execution_id } => {
            print_json(&state.execution_api.get_execution(execution_id)?)
        }
        Command::Executions { id_proceso } => {
            print_json(&state.execution_api.list_process_executions(id_proceso)?)
        }
        Command::Stats => print_json(&state.statistics_api.get_statistics()?),
        Command::Availability => print_json(&state.config_api.availability(Utc::now())),
        Command::Schedule {
            start_hour,
            duration_hours,
        } => print_json(
            &state
                .config_api
                .update_schedule(&caller, start_hour, duration_hours)?,
        ),
        Command::SummaryGenerate => print_json(
            &state
                .config_api
                .generate_daily_summary(&caller, Utc::now())?,
        ),
        Command::Summary => print_json(&state.config_api.get_daily_summary(Utc::now())?),
    }
}
