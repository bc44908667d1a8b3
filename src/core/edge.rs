//! Directed relationship records between account nodes.
//!
//! 边是独立的日志记录，按 (src, dst, kind, timestamp) 标识，归属于存储层，
//! 账号节点之间不持有对象引用，避免环状引用。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::time;

/// Edge kinds recorded by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// 创建关系：创建者 -> 被创建账号，仅用于审计
    Created,
    /// 提升关系：操作者（引导升级时为引导账号）-> 被提升账号
    Promoted,
    /// 降级投票：投票管理员 -> 目标管理员，按 (src, dst) 幂等
    DemotionVote,
    /// 降级执行：每个确认投票者 -> 被降级账号，与角色变更同事务写入
    Demoted,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Created => "CREATED",
            EdgeKind::Promoted => "PROMOTED",
            EdgeKind::DemotionVote => "DEMOTION_VOTE",
            EdgeKind::Demoted => "DEMOTED",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge between two account nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    /// 边记录标识
    pub id: Uuid,
    /// Source account handle
    pub src: String,
    /// Target account handle
    pub dst: String,
    /// Edge kind
    pub kind: EdgeKind,
    /// 写入时间（epoch 毫秒）
    pub created_at: i64,
}

impl RelationEdge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: src.into(),
            dst: dst.into(),
            kind,
            created_at: time::now_millis(),
        }
    }

    /// Check whether the edge touches the given account.
    pub fn touches(&self, handle: &str) -> bool {
        self.src == handle || self.dst == handle
    }
}
