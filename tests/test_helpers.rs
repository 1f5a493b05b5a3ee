// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、应用状态、请求构造
// ==========================================

#![allow(dead_code)]

use process_conformity::app::AppState;
use process_conformity::domain::{EntradaReading, IndicatorRule, SalidaReading, Stage};
use process_conformity::{Caller, CallerRole};
use std::error::Error;
use tempfile::TempDir;

/// 创建临时目录与数据库路径
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活，汇总缓存文件也写在其中）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(TempDir, String), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let db_path = dir
        .path()
        .join("process_conformity_test.db")
        .to_string_lossy()
        .to_string();
    Ok((dir, db_path))
}

/// 创建完整的测试应用状态
pub async fn create_test_state() -> (TempDir, AppState) {
    process_conformity::logging::init_test();
    let (dir, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).await.unwrap();
    (dir, state)
}

pub fn admin() -> Caller {
    Caller {
        id: 1,
        email: "admin@planta.co".to_string(),
        role: CallerRole::Admin,
    }
}

pub fn operator() -> Caller {
    Caller {
        id: 2,
        email: "operador@planta.co".to_string(),
        role: CallerRole::Operator,
    }
}

/// 单输入单输出阶段（输入与输出同 ID）
pub fn single_stage(num_etapa: i64, material_id: i64, value: f64, rules: Vec<IndicatorRule>) -> Stage {
    Stage {
        num_etapa,
        entradas: vec![EntradaReading {
            id: material_id,
            value,
        }],
        indicadores: rules,
        salidas: vec![SalidaReading {
            id: material_id,
            value: 0.0,
        }],
    }
}
