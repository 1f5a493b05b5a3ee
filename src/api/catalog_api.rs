// ==========================================
// 工序执行质量追踪系统 - 目录 API
// ==========================================
// 职责: 工艺流程、物料、指标定义的创建/查询/更新
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::{
    IndicatorDefinition, MaterialDefinition, NewIndicator, NewMaterial, NewProcess,
    ProcessDefinition,
};
use crate::domain::types::Caller;
use crate::repository::catalog_repo::{
    IndicatorDefRepository, MaterialDefRepository, ProcessDefRepository,
};
use std::sync::Arc;
use tracing::info;

pub struct CatalogApi {
    process_repo: Arc<ProcessDefRepository>,
    material_repo: Arc<MaterialDefRepository>,
    indicator_repo: Arc<IndicatorDefRepository>,
}

fn require_name(nombre: &str) -> ApiResult<()> {
    if nombre.trim().is_empty() {
        return Err(ApiError::ValidationError("名称不能为空".to_string()));
    }
    Ok(())
}

impl CatalogApi {
    pub fn new(
        process_repo: Arc<ProcessDefRepository>,
        material_repo: Arc<MaterialDefRepository>,
        indicator_repo: Arc<IndicatorDefRepository>,
    ) -> Self {
        Self {
            process_repo,
            material_repo,
            indicator_repo,
        }
    }

    // ==========================================
    // 工艺流程
    // ==========================================

    pub fn create_process(&self, caller: &Caller, new: &NewProcess) -> ApiResult<ProcessDefinition> {
        require_name(&new.nombre)?;
        if new.num_etapas < 0 {
            return Err(ApiError::ValidationError(format!(
                "阶段数不能为负: {}",
                new.num_etapas
            )));
        }
        let created = self.process_repo.create(new, caller.id)?;
        info!(id = created.id, nombre = %created.nombre, "流程已创建");
        Ok(created)
    }

    pub fn get_process(&self, id: i64) -> ApiResult<ProcessDefinition> {
        self.process_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("流程(id={})不存在", id)))
    }

    pub fn list_processes(&self) -> ApiResult<Vec<ProcessDefinition>> {
        Ok(self.process_repo.list_all()?)
    }

    pub fn update_process(&self, process: &ProcessDefinition) -> ApiResult<()> {
        require_name(&process.nombre)?;
        Ok(self.process_repo.update(process)?)
    }

    // ==========================================
    // 物料（输入/输出）
    // ==========================================

    pub fn create_material(
        &self,
        caller: &Caller,
        new: &NewMaterial,
    ) -> ApiResult<MaterialDefinition> {
        require_name(&new.nombre)?;
        let created = self.material_repo.create(new, caller.id)?;
        info!(id = created.id, nombre = %created.nombre, "物料已创建");
        Ok(created)
    }

    pub fn get_material(&self, id: i64) -> ApiResult<MaterialDefinition> {
        self.material_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("物料(id={})不存在", id)))
    }

    pub fn list_materials(&self) -> ApiResult<Vec<MaterialDefinition>> {
        Ok(self.material_repo.list_all()?)
    }

    pub fn update_material(&self, material: &MaterialDefinition) -> ApiResult<()> {
        require_name(&material.nombre)?;
        Ok(self.material_repo.update(material)?)
    }

    // ==========================================
    // 指标
    // ==========================================

    /// 创建指标（关联的输入物料必须存在）
    pub fn create_indicator(
        &self,
        caller: &Caller,
        new: &NewIndicator,
    ) -> ApiResult<IndicatorDefinition> {
        require_name(&new.nombre)?;
        self.get_material(new.entrada_id)?;
        let created = self.indicator_repo.create(new, caller.id)?;
        info!(id = created.id, entrada_id = created.entrada_id, "指标已创建");
        Ok(created)
    }

    pub fn get_indicator(&self, id: i64) -> ApiResult<IndicatorDefinition> {
        self.indicator_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("指标(id={})不存在", id)))
    }

    pub fn list_indicators(&self) -> ApiResult<Vec<IndicatorDefinition>> {
        Ok(self.indicator_repo.list_all()?)
    }

    pub fn list_indicators_for_material(&self, entrada_id: i64) -> ApiResult<Vec<IndicatorDefinition>> {
        Ok(self.indicator_repo.list_by_entrada(entrada_id)?)
    }

    pub fn update_indicator(&self, indicator: &IndicatorDefinition) -> ApiResult<()> {
        require_name(&indicator.nombre)?;
        self.get_material(indicator.entrada_id)?;
        Ok(self.indicator_repo.update(indicator)?)
    }
}
