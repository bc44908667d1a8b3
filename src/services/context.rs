//! 服务上下文
//!
//! 把共享存储与配置装配成目录、共识引擎和认证器三个服务，供应用层
//! 作为单一入口使用。

use std::sync::Arc;

use crate::auth::SessionAuthenticator;
use crate::config::Config;
use crate::core::EngineResult;
use crate::services::{IdentityDirectory, RoleConsensusEngine};
use crate::storage::{self, GraphStore};

pub struct ServiceContext {
    pub directory: IdentityDirectory,
    pub consensus: RoleConsensusEngine,
    pub authenticator: SessionAuthenticator,
}

impl ServiceContext {
    /// 在已有存储上装配服务
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self {
            directory: IdentityDirectory::new(store.clone(), config),
            consensus: RoleConsensusEngine::new(store.clone(), config),
            authenticator: SessionAuthenticator::new(store, config),
        }
    }

    /// 按配置打开存储后端并装配服务
    pub fn open(config: &Config) -> EngineResult<Self> {
        let store = storage::open(&config.store)?;
        Ok(Self::new(store, config))
    }
}
