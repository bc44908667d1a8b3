//! 统一错误处理系统
//!
//! ## 设计理念
//!
//! 1. **分层设计**：存储层使用独立的 `StorageError`，业务层使用 `EngineError`，
//!    通过 `From` 转换向上传播，业务代码统一使用 `?` 传播错误。
//! 2. **键语义映射**：存储层的键冲突/键缺失在转换时映射为业务语义
//!    （`DuplicateHandle` / `NotFound`），调用方无需感知存储细节。
//! 3. **可重试区分**：写事务冲突单独映射为 `Contention`，调用方可以安全重试
//!    （投票记录按 (voter, target) 幂等，重试不会重复计票）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 业务层统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("账号已存在: {0}")]
    DuplicateHandle(String),

    #[error("非法的账号标识: {0}")]
    InvalidHandle(String),

    #[error("凭据不符合安全策略: {0}")]
    InvalidCredential(String),

    #[error("账号不存在: {0}")]
    NotFound(String),

    /// 认证失败。未知账号与密码错误统一折叠为本错误，避免账号枚举。
    #[error("认证失败")]
    AuthenticationFailed,

    #[error("权限不足: {0}")]
    Forbidden(String),

    #[error("当前状态不允许该操作: {0}")]
    InvalidState(String),

    /// 写事务冲突，可安全重试
    #[error("写事务冲突: {0}")]
    Contention(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("存储错误: {0}")]
    Storage(StorageError),
}

/// 统一的结果类型
pub type EngineResult<T> = Result<T, EngineError>;

/// 存储层错误类型
///
/// 涵盖图存储底层操作相关的错误
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    DbError(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("键已存在: {0}")]
    DuplicateKey(String),

    #[error("键不存在: {0}")]
    KeyNotFound(String),

    /// 写事务获取超时，存在并发写入者
    #[error("写事务冲突: {0}")]
    WriteConflict(String),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey(key) => EngineError::DuplicateHandle(key),
            StorageError::KeyNotFound(key) => EngineError::NotFound(key),
            StorageError::WriteConflict(msg) => EngineError::Contention(msg),
            other => EngineError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_maps_to_duplicate_handle() {
        let err: EngineError = StorageError::DuplicateKey("alice".to_string()).into();
        assert_eq!(err, EngineError::DuplicateHandle("alice".to_string()));
    }

    #[test]
    fn test_write_conflict_maps_to_contention() {
        let err: EngineError = StorageError::WriteConflict("busy".to_string()).into();
        assert!(matches!(err, EngineError::Contention(_)));
    }

    #[test]
    fn test_db_error_stays_storage() {
        let err: EngineError = StorageError::DbError("io".to_string()).into();
        assert!(matches!(err, EngineError::Storage(StorageError::DbError(_))));
    }
}
