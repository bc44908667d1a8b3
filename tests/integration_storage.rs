//! 存储后端集成测试
//!
//! 测试范围:
//! - 写事务冲突以可重试的 Contention 形式暴露给业务层
//! - redb 持久化后端上的完整业务流程与重开恢复

mod common;

use common::{TestBed, PASSWORD, SEED};
use trustgraph::config::Config;
use trustgraph::core::EngineError;
use trustgraph::storage::GraphStore;

#[test]
fn test_write_conflict_surfaces_as_contention() {
    let mut config = Config::default();
    config.store.write_timeout_ms = 50;
    let bed = TestBed::with_config(config);
    bed.services
        .directory
        .create_account("alice", PASSWORD, SEED)
        .expect("创建失败");
    bed.services
        .directory
        .create_account("bob", PASSWORD, "alice")
        .expect("创建失败");

    // 直接占住存储的写者，模拟一个长事务
    let held = bed.store.begin_write().expect("开启写事务失败");

    let err = bed.services.consensus.promote("alice", "bob").unwrap_err();
    assert!(
        matches!(err, EngineError::Contention(_)),
        "写者被占用时业务调用应快速失败为可重试的冲突: {:?}",
        err
    );

    // 冲突方放弃后操作可以重试成功
    drop(held);
    bed.services.consensus.promote("alice", "bob").expect("重试失败");
}

#[cfg(feature = "redb")]
mod redb_backend {
    use super::*;
    use trustgraph::core::Role;
    use trustgraph::services::{DemotionOutcome, ServiceContext};

    fn redb_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.store.backend = "redb".to_string();
        config.store.path = dir
            .path()
            .join("trustgraph.redb")
            .to_string_lossy()
            .into_owned();
        config
    }

    #[test]
    fn test_full_flow_on_redb_survives_reopen() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let config = redb_config(&dir);

        {
            let services = ServiceContext::open(&config).expect("打开服务失败");
            services
                .directory
                .ensure_seed(SEED, "open-sesame")
                .expect("引导失败");
            services
                .directory
                .create_account("alice", PASSWORD, SEED)
                .expect("创建失败");
            for handle in ["bob", "carol"] {
                services
                    .directory
                    .create_account(handle, PASSWORD, "alice")
                    .expect("创建失败");
                services
                    .consensus
                    .promote("alice", handle)
                    .expect("提升失败");
            }
            services
                .consensus
                .cast_demotion_vote("bob", "alice")
                .expect("投票失败");
            let outcome = services
                .consensus
                .cast_demotion_vote("carol", "alice")
                .expect("投票失败");
            assert_eq!(outcome, DemotionOutcome::Demoted { votes: 2 });
        }

        // 重新打开：角色状态与边日志都已持久化
        let services = ServiceContext::open(&config).expect("重新打开失败");
        assert_eq!(
            services.directory.lookup("alice").expect("查询失败").role,
            Role::Member
        );
        assert_eq!(
            services.directory.count_by_role(Role::Admin).expect("统计失败"),
            2
        );
        assert!(
            services.consensus.demotion_votes("alice").expect("查询投票失败").is_empty(),
            "已执行的降级不应遗留投票"
        );
        services
            .authenticator
            .authenticate("alice", PASSWORD)
            .expect("重开后认证失败");
    }

    #[test]
    fn test_ensure_seed_idempotent_across_reopen() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let config = redb_config(&dir);

        {
            let services = ServiceContext::open(&config).expect("打开服务失败");
            services
                .directory
                .ensure_seed(SEED, "open-sesame")
                .expect("引导失败");
        }

        let services = ServiceContext::open(&config).expect("重新打开失败");
        let seed = services
            .directory
            .ensure_seed(SEED, "open-sesame")
            .expect("重复引导失败");
        assert_eq!(seed.role, Role::Seed);
        assert_eq!(
            services.directory.count_by_role(Role::Seed).expect("统计失败"),
            1
        );
    }
}
