// ==========================================
// 流程执行集成测试
// ==========================================
// 职责: 验证执行事务（提交/回滚）、台账累加、并发执行
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod execution_flow_test {
    use futures::future::join_all;
    use process_conformity::db::open_sqlite_connection;
    use process_conformity::domain::{
        ActivityKind, EntradaReading, ExecutionRequest, IndicatorRule, SalidaReading, Stage,
    };
    use process_conformity::repository::MaterialLedgerRepository;
    use std::sync::{Arc, Mutex};

    use crate::test_helpers::{create_test_state, operator, single_stage};

    fn ledger_repo(db_path: &str) -> MaterialLedgerRepository {
        let conn = open_sqlite_connection(db_path).unwrap();
        MaterialLedgerRepository::new(Arc::new(Mutex::new(conn)))
    }

    // ==========================================
    // 正常执行
    // ==========================================

    #[tokio::test]
    async fn test_two_stage_execution_totals() {
        let (_dir, state) = create_test_state().await;

        let request = ExecutionRequest {
            id_proceso: 7,
            etapas: vec![
                single_stage(1, 1, 50.0, vec![IndicatorRule::new(1, 1).with_criteria("10")]),
                single_stage(2, 2, 30.0, vec![]),
            ],
        };

        let response = state.execution_api.execute(&request, &operator()).unwrap();
        assert_eq!(response.conformes, 70);
        assert_eq!(response.no_conformes, 10);
        assert_eq!(response.tasa_de_exito, 87.5);
        assert_eq!(response.num_etapas_con_conformidades, 2);
        assert_eq!(response.etapas.len(), 2);
        assert!(response.etapas[0].state);
        assert!(!response.etapas[1].state);

        // 历史记录与响应一致
        let record = state
            .execution_api
            .get_execution(response.id_proceso_ejecutado)
            .unwrap();
        assert_eq!(record.id_proceso, 7);
        assert_eq!(record.cantidad_entrada, 80.0);
        assert_eq!(record.etapas, response.etapas);

        // 台账: 输入=接收，输出=发出
        let ledger = ledger_repo(&state.db_path);
        let m1 = ledger.find_by_id(1).unwrap().unwrap();
        assert_eq!(m1.cantidad_entrada, 50.0);
        assert_eq!(m1.cantidad_salida, 40.0);
        assert_eq!(m1.usos, 2);
        let m2 = ledger.find_by_id(2).unwrap().unwrap();
        assert_eq!(m2.cantidad_entrada, 30.0);
        assert_eq!(m2.cantidad_salida, 30.0);

        // 活动日志记录执行人
        let logs = state
            .activity_log_repo
            .find_by_ref(ActivityKind::Execution, response.id_proceso_ejecutado)
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].actor_id, operator().id);
    }

    #[tokio::test]
    async fn test_empty_execution_has_zero_rate() {
        let (_dir, state) = create_test_state().await;

        let response = state
            .execution_api
            .execute(
                &ExecutionRequest {
                    id_proceso: 1,
                    etapas: vec![],
                },
                &operator(),
            )
            .unwrap();
        assert_eq!(response.conformes, 0);
        assert_eq!(response.no_conformes, 0);
        assert_eq!(response.tasa_de_exito, 0.0);
    }

    // ==========================================
    // 事务回滚
    // ==========================================

    #[tokio::test]
    async fn test_invalid_rule_rolls_back_everything() {
        let (_dir, state) = create_test_state().await;

        // 第一阶段合法并已写台账，第二阶段判据非法
        let request = ExecutionRequest {
            id_proceso: 3,
            etapas: vec![
                single_stage(1, 1, 100.0, vec![IndicatorRule::new(1, 1).with_range("80-120")]),
                single_stage(2, 2, 40.0, vec![IndicatorRule::new(2, 2).with_criteria("diez%")]),
            ],
        };

        let err = state
            .execution_api
            .execute(&request, &operator())
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let ledger = ledger_repo(&state.db_path);
        assert!(ledger.find_by_id(1).unwrap().is_none());
        assert!(ledger.find_by_id(2).unwrap().is_none());
        assert!(state.execution_api.list_history().unwrap().is_empty());
        assert!(state.activity_log_repo.find_recent(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_reading_rejected_before_transaction() {
        let (_dir, state) = create_test_state().await;

        let request = ExecutionRequest {
            id_proceso: 3,
            etapas: vec![single_stage(1, 1, -5.0, vec![])],
        };
        let err = state
            .execution_api
            .execute(&request, &operator())
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(state.execution_api.list_history().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_unmatched_output_rejected_and_ledger_untouched() {
        let (_dir, state) = create_test_state().await;

        let request = ExecutionRequest {
            id_proceso: 3,
            etapas: vec![Stage {
                num_etapa: 0,
                entradas: vec![EntradaReading { id: 1, value: 10.0 }],
                indicadores: vec![],
                salidas: vec![SalidaReading { id: 2, value: -500.0 }],
            }],
        };
        let err = state
            .execution_api
            .execute(&request, &operator())
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let ledger = ledger_repo(&state.db_path);
        assert!(ledger.find_by_id(1).unwrap().is_none());
        assert!(ledger.find_by_id(2).unwrap().is_none());
        assert!(state.execution_api.list_history().unwrap().is_empty());
    }

    // ==========================================
    // 按流程查询执行汇总
    // ==========================================

    #[tokio::test]
    async fn test_list_process_executions() {
        let (_dir, state) = create_test_state().await;

        for (id_proceso, criteria) in [(4, "10%"), (4, "20%"), (5, "10%")] {
            let request = ExecutionRequest {
                id_proceso,
                etapas: vec![single_stage(
                    0,
                    1,
                    100.0,
                    vec![IndicatorRule::new(1, 1).with_criteria(criteria)],
                )],
            };
            state.execution_api.execute(&request, &operator()).unwrap();
        }

        let summaries = state.execution_api.list_process_executions(4).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.id_proceso == 4));
        assert_eq!(summaries[0].conformidades, 90);
        assert_eq!(summaries[1].conformidades, 80);
        assert_eq!(summaries[1].cantidad_salida, 80.0);
        assert_eq!(summaries[1].cantidad_entrada, 100.0);

        let single = state
            .execution_api
            .get_execution_summary(summaries[1].id)
            .unwrap();
        assert_eq!(single, summaries[1]);
        assert!(state.execution_api.list_process_executions(6).unwrap().is_empty());
    }

    // ==========================================
    // 并发执行
    // ==========================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_executions_keep_ledger_exact() {
        let (_dir, state) = create_test_state().await;
        const RUNS: usize = 16;

        let tasks = (0..RUNS).map(|i| {
            let api = state.execution_api.clone();
            tokio::task::spawn_blocking(move || {
                let request = ExecutionRequest {
                    id_proceso: (i % 3) as i64 + 1,
                    etapas: vec![single_stage(
                        1,
                        5,
                        20.0,
                        vec![IndicatorRule::new(1, 5).with_criteria("25%")],
                    )],
                };
                api.execute(&request, &operator())
            })
        });

        let results = join_all(tasks).await;
        for result in results {
            let response = result.unwrap().unwrap();
            assert_eq!(response.conformes, 15);
            assert_eq!(response.no_conformes, 5);
        }

        let entry = ledger_repo(&state.db_path).find_by_id(5).unwrap().unwrap();
        assert_eq!(entry.cantidad_entrada, 20.0 * RUNS as f64);
        assert_eq!(entry.cantidad_salida, 15.0 * RUNS as f64);
        assert_eq!(entry.usos, 2 * RUNS as i64);
        assert_eq!(state.execution_api.list_history().unwrap().len(), RUNS);
    }

    // ==========================================
    // 预览
    // ==========================================

    #[tokio::test]
    async fn test_preview_is_repeatable_without_checkbox() {
        let (_dir, state) = create_test_state().await;

        let stage = single_stage(0, 1, 50.0, vec![IndicatorRule::new(1, 1).with_criteria("10%")]);
        let first = state.execution_api.preview(&stage).unwrap();
        let second = state.execution_api.preview(&stage).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.preview.no_conformes, 5);
        assert_eq!(first.preview.salidas[0].value, 45.0);

        assert!(ledger_repo(&state.db_path).find_by_id(1).unwrap().is_none());
    }
}
