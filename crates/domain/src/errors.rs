//! 领域模型错误定义
//!
//! 只有三类错误：角色非法、缺少字段、资源不存在。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 角色既不是 user 也不是 liveagent
    #[error("角色非法: {role}")]
    InvalidRole { role: String },

    /// 必填字段缺失或为空
    #[error("缺少必填字段: {field}")]
    MissingField { field: &'static str },

    /// 资源不存在
    #[error("资源不存在: {resource_type} {resource_id}")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },
}

impl DomainError {
    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole { role: role.into() }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// 创建资源不存在错误
    pub fn not_found(resource_type: &'static str, resource_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            resource_id: resource_id.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
