// ==========================================
// 配置管理 API 集成测试
// ==========================================
// 职责: 验证可用时段配置、权限控制、每日汇总生成与读取
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod config_api_test {
    use chrono::{TimeZone, Utc};
    use process_conformity::app::AppState;
    use process_conformity::config::config_keys;
    use process_conformity::domain::{
        ExecutionRequest, IndicatorRule, NewIndicator, NewMaterial, NewProcess,
    };
    use process_conformity::{IndicatorKind, ValueKind};

    use crate::test_helpers::{admin, create_test_db, create_test_state, operator, single_stage};

    // ==========================================
    // 可用时段
    // ==========================================

    #[tokio::test]
    async fn test_default_window_is_four_to_five_local() {
        let (_dir, state) = create_test_state().await;

        // UTC-5: 09:30Z = 04:30 本地
        let inside = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        let status = state.config_api.availability(inside);
        assert!(status.disponible);
        assert_eq!(status.inicio, "04:00");
        assert_eq!(status.fin, "05:00");

        // 两端闭区间
        let at_end = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        assert!(state.config_api.availability(at_end).disponible);
        let after = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 1).unwrap();
        assert!(!state.config_api.availability(after).disponible);
    }

    #[tokio::test]
    async fn test_update_schedule_requires_admin() {
        let (_dir, state) = create_test_state().await;

        let err = state
            .config_api
            .update_schedule(&operator(), 6, 2)
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        assert_eq!(
            state.config_api.availability(Utc::now()).inicio,
            "04:00"
        );
    }

    #[tokio::test]
    async fn test_update_schedule_rejects_invalid_window() {
        let (_dir, state) = create_test_state().await;

        for (start, duration) in [(24, 1), (3, 0), (3, 25)] {
            let err = state
                .config_api
                .update_schedule(&admin(), start, duration)
                .unwrap_err();
            assert_eq!(err.code(), "CONFIGURATION_ERROR");
        }
        assert_eq!(
            state.config_api.get_config_value(config_keys::AVAILABILITY_START_HOUR).unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_schedule_applies_and_persists() {
        let (_dir, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path.clone()).await.unwrap();

        let response = state.config_api.update_schedule(&admin(), 14, 2).unwrap();
        assert_eq!(response.hora_inicio, 14);
        assert_eq!(response.duracion_horas, 2);

        // 14:30 本地 = 19:30Z
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 19, 30, 0).unwrap();
        assert!(state.config_api.availability(now).disponible);

        // 重新加载后仍生效
        drop(state);
        let reloaded = AppState::new(db_path).await.unwrap();
        let status = reloaded.config_api.availability(now);
        assert!(status.disponible);
        assert_eq!(status.inicio, "14:00");
        assert_eq!(status.fin, "16:00");
    }

    // ==========================================
    // 每日汇总
    // ==========================================

    #[tokio::test]
    async fn test_summary_not_found_before_generation() {
        let (_dir, state) = create_test_state().await;

        let outside = Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap();
        let err = state.config_api.get_daily_summary(outside).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_summary_unavailable_inside_window() {
        let (_dir, state) = create_test_state().await;
        state
            .config_api
            .generate_daily_summary(&admin(), Utc::now())
            .unwrap();

        let inside = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        let err = state.config_api.get_daily_summary(inside).unwrap_err();
        assert_eq!(err.code(), "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_generate_summary_requires_admin() {
        let (_dir, state) = create_test_state().await;

        let err = state
            .config_api
            .generate_daily_summary(&operator(), Utc::now())
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_generate_summary_counts_today() {
        let (_dir, state) = create_test_state().await;

        state
            .catalog_api
            .create_process(
                &admin(),
                &NewProcess {
                    nombre: "Laminado".to_string(),
                    descripcion: Some("Línea 1".to_string()),
                    num_etapas: 2,
                },
            )
            .unwrap();
        let material = state
            .catalog_api
            .create_material(
                &admin(),
                &NewMaterial {
                    nombre: "Acero".to_string(),
                    tipo: ValueKind::Float,
                },
            )
            .unwrap();
        state
            .catalog_api
            .create_indicator(
                &admin(),
                &NewIndicator {
                    nombre: "Espesor".to_string(),
                    tipo: IndicatorKind::Range,
                    entrada_id: material.id,
                },
            )
            .unwrap();

        for criteria in ["10%", "20%"] {
            let request = ExecutionRequest {
                id_proceso: 1,
                etapas: vec![single_stage(
                    0,
                    material.id,
                    100.0,
                    vec![IndicatorRule::new(1, material.id).with_criteria(criteria)],
                )],
            };
            state.execution_api.execute(&request, &operator()).unwrap();
        }

        let generated = state
            .config_api
            .generate_daily_summary(&admin(), Utc::now())
            .unwrap();
        let hoy = &generated.resumen.hoy;
        assert_eq!(hoy.procesos, 1);
        assert_eq!(hoy.entradas_salidas, 1);
        assert_eq!(hoy.indicadores, 1);
        assert_eq!(hoy.procesos_ejecutados, 2);
        assert_eq!(hoy.produccion, 90 + 80);
        assert_eq!(hoy.no_conformes, 10 + 20);

        let ayer = &generated.resumen.ayer;
        assert_eq!(ayer.fecha, hoy.fecha.pred_opt().unwrap());
        assert_eq!(ayer.procesos_ejecutados, 0);

        // 缓存可在可用时段之外读取
        let outside = Utc.with_ymd_and_hms(2026, 10, 17, 20, 0, 0).unwrap();
        let cached = state.config_api.get_daily_summary(outside).unwrap();
        assert_eq!(cached, generated.resumen);
    }

    // ==========================================
    // 通用配置项
    // ==========================================

    #[tokio::test]
    async fn test_config_values_admin_only() {
        let (_dir, state) = create_test_state().await;

        let err = state
            .config_api
            .set_config_value(&operator(), config_keys::RANDOM_SEED, "42")
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        state
            .config_api
            .set_config_value(&admin(), config_keys::RANDOM_SEED, "42")
            .unwrap();
        assert_eq!(
            state.config_api.get_config_value(config_keys::RANDOM_SEED).unwrap(),
            Some("42".to_string())
        );
        assert!(state
            .config_api
            .get_config_snapshot()
            .unwrap()
            .contains(config_keys::RANDOM_SEED));
    }
}
