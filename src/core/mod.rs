//! 核心数据模型与错误类型

pub mod account;
pub mod edge;
pub mod error;
pub mod role;

pub use account::Account;
pub use edge::{EdgeKind, RelationEdge};
pub use error::{EngineError, EngineResult, StorageError};
pub use role::Role;
