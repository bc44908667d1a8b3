//! 角色共识引擎
//!
//! 提升与降级的全部状态转移。降级是一个小型法定人数协议：投票是按
//! (voter, target) 幂等的一等记录，计票与角色变更在同一写事务的同一
//! 次一致读上判定，两个并发达到法定人数的调用不可能同时执行降级，
//! 也不可能把管理员数量压到下限以下。
//!
//! 引导账号永不参与任何转移：既不能被提升，也不能被降级。

use std::sync::Arc;

use crate::config::Config;
use crate::core::{Account, EdgeKind, EngineError, EngineResult, RelationEdge, Role, StorageError};
use crate::storage::{GraphReader, GraphStore};

/// 降级法定人数规则
#[derive(Debug, Clone, Copy)]
pub struct ConsensusRules {
    /// 执行降级所需的最少不同管理员票数
    pub demotion_quorum: usize,
    /// 任何降级后必须保留的最少管理员数量（引导账号不计入）
    pub min_admins: usize,
}

impl ConsensusRules {
    /// 票数是否达到法定人数
    pub fn quorum_reached(&self, votes: usize) -> bool {
        votes >= self.demotion_quorum
    }

    /// 移除目标后剩余管理员是否不低于下限
    pub fn demotion_safe(&self, current_admins: usize) -> bool {
        current_admins.saturating_sub(1) >= self.min_admins
    }
}

impl From<&Config> for ConsensusRules {
    fn from(config: &Config) -> Self {
        Self {
            demotion_quorum: config.consensus.demotion_quorum,
            min_admins: config.consensus.min_admins,
        }
    }
}

/// 一次降级投票的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemotionOutcome {
    /// 票已记录（或已存在），尚未达到法定人数
    Pending { votes: usize, quorum: usize },
    /// 达到法定人数，降级已在本次调用内执行
    Demoted { votes: usize },
    /// 达到法定人数，但执行会使管理员数量低于下限，票保留、角色不变
    WithheldMinimumAdmins { votes: usize },
}

pub struct RoleConsensusEngine {
    store: Arc<dyn GraphStore>,
    rules: ConsensusRules,
}

/// 目标当前有效的降级投票：只统计投票者此刻仍是管理员的票。
/// 投票者自己被降级后，其在途投票随角色一起失效。
fn counting_votes<T: GraphReader + ?Sized>(
    txn: &T,
    target: &str,
) -> Result<Vec<RelationEdge>, StorageError> {
    let mut votes = Vec::new();
    for vote in txn.edges_to(target, EdgeKind::DemotionVote)? {
        if let Some(account) = txn.account(&vote.src)? {
            if account.role.is_admin() {
                votes.push(vote);
            }
        }
    }
    Ok(votes)
}

impl RoleConsensusEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self {
            store,
            rules: ConsensusRules::from(config),
        }
    }

    pub fn rules(&self) -> ConsensusRules {
        self.rules
    }

    /// 将成员提升为管理员
    ///
    /// 重复提升是可报告的状态错误而不是静默成功。
    pub fn promote(&self, actor: &str, target: &str) -> EngineResult<Account> {
        let mut txn = self.store.begin_write()?;

        let actor_account = txn
            .account(actor)?
            .ok_or_else(|| EngineError::NotFound(actor.to_string()))?;
        if !actor_account.role.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "角色 {} 无权提升成员",
                actor_account.role
            )));
        }

        let mut target_account = txn
            .account(target)?
            .ok_or_else(|| EngineError::NotFound(target.to_string()))?;
        match target_account.role {
            Role::Seed => {
                return Err(EngineError::InvalidState(
                    "引导账号不参与角色转移".to_string(),
                ));
            }
            Role::Admin => {
                return Err(EngineError::InvalidState(format!(
                    "账号 {} 已是管理员",
                    target
                )));
            }
            Role::Member => {}
        }

        target_account.role = Role::Admin;
        txn.update_account(&target_account)?;
        txn.insert_edge(&RelationEdge::new(actor, target, EdgeKind::Promoted))?;
        txn.commit()?;

        log::info!("账号 {} 已由 {} 提升为管理员", target, actor);
        Ok(target_account)
    }

    /// 对目标管理员投降级确认票
    ///
    /// 同一 (voter, target) 重复投票是幂等 no-op，返回当前票数。票
    /// 记录后立即在同一事务内评估法定人数规则；达到且安全则降级、
    /// 写入降级边并清空目标的全部在途投票，达到但不安全则保留投票
    /// 并返回抑制信号。
    pub fn cast_demotion_vote(&self, voter: &str, target: &str) -> EngineResult<DemotionOutcome> {
        let mut txn = self.store.begin_write()?;

        let voter_account = txn
            .account(voter)?
            .ok_or_else(|| EngineError::NotFound(voter.to_string()))?;
        if !voter_account.role.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "角色 {} 无权参与降级投票",
                voter_account.role
            )));
        }
        if voter == target {
            return Err(EngineError::InvalidState(
                "不能对自己投降级票".to_string(),
            ));
        }

        let mut target_account = txn
            .account(target)?
            .ok_or_else(|| EngineError::NotFound(target.to_string()))?;
        if !target_account.role.is_admin() {
            return Err(EngineError::InvalidState(format!(
                "账号 {} 不是管理员，无法降级",
                target
            )));
        }

        // 按 (voter, target) 幂等记录
        if txn
            .edge_between(voter, target, EdgeKind::DemotionVote)?
            .is_none()
        {
            txn.insert_edge(&RelationEdge::new(voter, target, EdgeKind::DemotionVote))?;
        }

        let votes = counting_votes(&*txn, target)?;
        let vote_count = votes.len();
        let admins = txn.count_by_role(Role::Admin)?;

        if !self.rules.quorum_reached(vote_count) {
            txn.commit()?;
            log::info!(
                "降级投票已记录: {} -> {}，当前 {}/{} 票",
                voter,
                target,
                vote_count,
                self.rules.demotion_quorum
            );
            return Ok(DemotionOutcome::Pending {
                votes: vote_count,
                quorum: self.rules.demotion_quorum,
            });
        }

        if !self.rules.demotion_safe(admins) {
            txn.commit()?;
            log::warn!(
                "降级 {} 已达法定人数但被抑制: 执行后管理员数量将低于 {}",
                target,
                self.rules.min_admins
            );
            return Ok(DemotionOutcome::WithheldMinimumAdmins { votes: vote_count });
        }

        // 法定人数达成且安全: 在同一事务内执行降级
        target_account.role = Role::Member;
        txn.update_account(&target_account)?;
        for vote in &votes {
            txn.insert_edge(&RelationEdge::new(
                vote.src.as_str(),
                target,
                EdgeKind::Demoted,
            ))?;
        }
        // 清空在途投票，未来重新提升后从零开始计票
        txn.delete_edges_to(target, EdgeKind::DemotionVote)?;
        txn.commit()?;

        let voters: Vec<&str> = votes.iter().map(|v| v.src.as_str()).collect();
        log::info!(
            "管理员 {} 已被降级为成员，确认者: {}",
            target,
            voters.join(", ")
        );
        Ok(DemotionOutcome::Demoted { votes: vote_count })
    }

    /// 撤回自己对目标的降级票
    ///
    /// 无在途投票时为 no-op。返回撤回后的剩余票数。
    pub fn retract_demotion_vote(&self, voter: &str, target: &str) -> EngineResult<usize> {
        let mut txn = self.store.begin_write()?;

        txn.account(voter)?
            .ok_or_else(|| EngineError::NotFound(voter.to_string()))?;
        txn.account(target)?
            .ok_or_else(|| EngineError::NotFound(target.to_string()))?;

        let removed = txn.delete_edge_between(voter, target, EdgeKind::DemotionVote)?;
        let remaining = counting_votes(&*txn, target)?.len();
        txn.commit()?;

        if removed {
            log::info!("降级投票已撤回: {} -> {}，剩余 {} 票", voter, target, remaining);
        }
        Ok(remaining)
    }

    /// 查询目标当前有效的在途降级投票
    pub fn demotion_votes(&self, target: &str) -> EngineResult<Vec<RelationEdge>> {
        let txn = self.store.begin_read()?;
        txn.account(target)?
            .ok_or_else(|| EngineError::NotFound(target.to_string()))?;
        Ok(counting_votes(&*txn, target)?)
    }
}
