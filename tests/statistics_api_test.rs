// ==========================================
// 统计 API 集成测试
// ==========================================
// 职责: 验证执行后统计报表（物料状态、不合格图、阶段概览、成功率排名）
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod statistics_api_test {
    use process_conformity::app::AppState;
    use process_conformity::domain::{ExecutionRequest, IndicatorRule, NewMaterial, NewProcess};
    use process_conformity::ValueKind;

    use crate::test_helpers::{admin, create_test_state, operator, single_stage};

    /// 目录: 流程 1/2/3，物料 1(有名称)
    fn seed_catalog(state: &AppState) {
        for nombre in ["Laminado", "Pintura", "Empaque"] {
            state
                .catalog_api
                .create_process(
                    &admin(),
                    &NewProcess {
                        nombre: nombre.to_string(),
                        descripcion: None,
                        num_etapas: 1,
                    },
                )
                .unwrap();
        }
        state
            .catalog_api
            .create_material(
                &admin(),
                &NewMaterial {
                    nombre: "Acero".to_string(),
                    tipo: ValueKind::Float,
                },
            )
            .unwrap();
    }

    fn run(state: &AppState, id_proceso: i64, num_etapa: i64, material_id: i64, value: f64, criteria: &str) {
        let request = ExecutionRequest {
            id_proceso,
            etapas: vec![single_stage(
                num_etapa,
                material_id,
                value,
                vec![IndicatorRule::new(1, material_id).with_criteria(criteria)],
            )],
        };
        state.execution_api.execute(&request, &operator()).unwrap();
    }

    #[tokio::test]
    async fn test_statistics_report_after_executions() {
        let (_dir, state) = create_test_state().await;
        seed_catalog(&state);

        // 流程1: 90% 与 50% → 平均 0.7
        run(&state, 1, 0, 1, 100.0, "10%");
        run(&state, 1, 1, 1, 100.0, "50%");
        // 流程2: 20% → 0.2
        run(&state, 2, 7, 9, 100.0, "80%");
        // 流程99: 目录中不存在
        run(&state, 99, 0, 1, 10.0, "0");

        let report = state.statistics_api.get_statistics().unwrap();

        // 物料9 没有目录名称，不出现
        assert_eq!(report.estado_entradas_salidas.len(), 1);
        let acero = &report.estado_entradas_salidas[0];
        assert_eq!(acero.nombre, "Acero");
        assert_eq!(acero.cantidad_entrada, 210.0);
        assert_eq!(acero.cantidad_salida, 90.0 + 50.0 + 10.0);
        assert_eq!(acero.usos, 6);

        assert_eq!(report.diagrama_no_conformidades.conformes, 90 + 50 + 20 + 10);
        assert_eq!(report.diagrama_no_conformidades.no_conformes, 10 + 50 + 80);

        // 默认阶段 0..=4；阶段 7 不统计
        let stages: Vec<i64> = report.estado_general_etapas.iter().map(|r| r.num_etapa).collect();
        assert_eq!(stages, vec![0, 1, 2, 3, 4]);
        assert_eq!(report.estado_general_etapas[0].conformes, 100);
        assert_eq!(report.estado_general_etapas[0].no_conformes, 10);
        assert_eq!(report.estado_general_etapas[1].conformes, 50);
        assert_eq!(report.estado_general_etapas[2].conformes, 0);

        assert_eq!(report.procesos_mayor_exito.len(), 1);
        assert_eq!(report.procesos_mayor_exito[0].nombre, "Laminado");
        assert!((report.procesos_mayor_exito[0].exito_promedio - 0.7).abs() < 1e-9);
        assert_eq!(report.procesos_menos_exito.len(), 1);
        assert_eq!(report.procesos_menos_exito[0].id_proceso, 2);
    }

    #[tokio::test]
    async fn test_process_without_executions_not_ranked() {
        let (_dir, state) = create_test_state().await;
        seed_catalog(&state);

        run(&state, 1, 0, 1, 10.0, "0");

        let ranking = state.statistics_api.process_success_ranking().unwrap();
        let ids: Vec<i64> = ranking
            .procesos_mayor_exito
            .iter()
            .chain(ranking.procesos_menos_exito.iter())
            .map(|p| p.id_proceso)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_empty_statistics() {
        let (_dir, state) = create_test_state().await;

        let report = state.statistics_api.get_statistics().unwrap();
        assert!(report.estado_entradas_salidas.is_empty());
        assert_eq!(report.diagrama_no_conformidades.conformes, 0);
        assert_eq!(report.diagrama_no_conformidades.no_conformes, 0);
        assert!(report
            .estado_general_etapas
            .iter()
            .all(|r| r.conformes == 0 && r.no_conformes == 0));
        assert!(report.procesos_menos_exito.is_empty());
        assert!(report.procesos_mayor_exito.is_empty());
    }
}
