// ==========================================
// 工序执行质量追踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将下层错误转换为调用方可理解的错误
// ==========================================

use crate::config::config_manager::ConfigError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: {0}")]
    Forbidden(String),

    #[error("当前不可用: {0}")]
    Unavailable(String),

    #[error("配置错误: {0}")]
    ConfigurationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("事务失败: {0}")]
    TransactionError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            ApiError::TransactionError(_) => "TRANSACTION_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::TransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            e @ (EngineError::InvalidCriteria { .. } | EngineError::InvalidRange { .. }) => {
                ApiError::ValidationError(e.to_string())
            }
            e @ EngineError::InvalidSchedule { .. } => ApiError::ConfigurationError(e.to_string()),
            EngineError::Ledger(inner)
            | EngineError::Store(inner)
            | EngineError::SummarySource(inner) => ApiError::from(inner),
            EngineError::SummaryCache(io) => ApiError::InternalError(io.to_string()),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            e @ ConfigError::OutOfRange { .. } => ApiError::ConfigurationError(e.to_string()),
            ConfigError::Storage(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::from(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_validation_maps_to_validation() {
        let err: ApiError = EngineError::InvalidRange {
            indicator_id: 1,
            raw: "x".to_string(),
        }
        .into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_wrapped_repository_error_unwrapped() {
        let err: ApiError = EngineError::Ledger(RepositoryError::not_found("Material", 3)).into();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_config_out_of_range() {
        let err: ApiError = ConfigError::OutOfRange {
            key: "k".to_string(),
            value: "99".to_string(),
            reason: "r".to_string(),
        }
        .into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }
}
