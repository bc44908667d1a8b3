//! 图存储层
//!
//! 存储是角色状态的唯一事实来源。每个公开操作在单个事务内完成
//! 读取-判定-写入，不存在跨事务的状态缓存。

pub mod graph_store;
pub mod memory_storage;
#[cfg(feature = "redb")]
pub mod redb_storage;

use std::sync::Arc;

pub use graph_store::{GraphReader, GraphStore, GraphWriter};
pub use memory_storage::MemoryGraph;
#[cfg(feature = "redb")]
pub use redb_storage::RedbGraph;

use crate::config::StoreConfig;
use crate::core::StorageError;

/// 按配置打开存储后端
pub fn open(config: &StoreConfig) -> Result<Arc<dyn GraphStore>, StorageError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryGraph::with_write_timeout_ms(
            config.write_timeout_ms,
        ))),
        #[cfg(feature = "redb")]
        "redb" => Ok(Arc::new(RedbGraph::open(&config.path)?)),
        other => Err(StorageError::DbError(format!(
            "未知的存储后端: {}",
            other
        ))),
    }
}
