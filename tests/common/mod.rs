//! 集成测试共享工具模块
//!
//! 提供预置引导账号的服务上下文，供所有集成测试使用。

#![allow(dead_code)]

use std::sync::Arc;

use trustgraph::config::Config;
use trustgraph::services::ServiceContext;
use trustgraph::storage::{GraphStore, MemoryGraph};

/// 引导账号 handle
pub const SEED: &str = "greeter";
/// 引导账号密码（带外提供，不受复杂度策略约束）
pub const SEED_PASSWORD: &str = "open-sesame";
/// 满足默认密码策略的测试密码
pub const PASSWORD: &str = "Str0ng!pass";

/// 测试环境：内存存储 + 三个服务，存储句柄单独保留以便直接检查图状态
pub struct TestBed {
    pub store: Arc<MemoryGraph>,
    pub services: ServiceContext,
}

impl TestBed {
    /// 以默认配置创建并完成引导
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// 以指定配置创建并完成引导
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryGraph::with_write_timeout_ms(
            config.store.write_timeout_ms,
        ));
        let dyn_store: Arc<dyn GraphStore> = store.clone();
        let services = ServiceContext::new(dyn_store, &config);
        services
            .directory
            .ensure_seed(SEED, SEED_PASSWORD)
            .expect("引导账号创建失败");
        Self { store, services }
    }

    /// 引导出首个管理员并返回其 handle
    pub fn with_first_admin(handle: &str) -> Self {
        let bed = Self::new();
        bed.services
            .directory
            .create_account(handle, PASSWORD, SEED)
            .expect("首个管理员创建失败");
        bed
    }
}
