//! 业务服务层
//!
//! 身份目录、角色共识引擎以及把两者与会话认证器装配在一起的服务上下文。

pub mod consensus;
pub mod context;
pub mod directory;

pub use consensus::{ConsensusRules, DemotionOutcome, RoleConsensusEngine};
pub use context::ServiceContext;
pub use directory::IdentityDirectory;
