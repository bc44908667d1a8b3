//! 身份目录
//!
//! 负责账号创建、唯一性、查询与受保护的删除。角色分配遵循引导规则：
//! 系统内不存在管理员时创建的账号自动成为首个管理员，该判定在创建
//! 事务内按管理员计数进行，不依赖调用顺序。

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::auth::{password, PasswordPolicy};
use crate::config::Config;
use crate::core::{Account, EdgeKind, EngineError, EngineResult, RelationEdge, Role};
use crate::storage::GraphStore;

/// 账号标识语法：首字符为字母或数字，其余允许 `_` `.` `-`，至多 64 字符
fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]{0,63}$").expect("合法的正则"))
}

/// 校验账号标识语法
pub fn validate_handle(handle: &str) -> EngineResult<()> {
    if handle.is_empty() {
        return Err(EngineError::InvalidHandle("账号标识不能为空".to_string()));
    }
    if !handle_re().is_match(handle) {
        return Err(EngineError::InvalidHandle(format!(
            "账号标识 {:?} 含有非法字符或超长",
            handle
        )));
    }
    Ok(())
}

pub struct IdentityDirectory {
    store: Arc<dyn GraphStore>,
    policy: PasswordPolicy,
    bcrypt_cost: u32,
    /// 删除管理员时必须保留的最少管理员数量
    min_admins: usize,
}

impl IdentityDirectory {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self {
            store,
            policy: PasswordPolicy::from(&config.auth),
            bcrypt_cost: config.auth.bcrypt_cost,
            min_admins: config.consensus.min_admins,
        }
    }

    /// 创建账号
    ///
    /// 创建者必须存在且角色允许创建（引导账号或管理员）。角色按引导
    /// 规则分配：事务内管理员计数为零则新账号直接成为管理员并记录
    /// 提升边，否则为普通成员。唯一性由存储层约束保证。
    pub fn create_account(
        &self,
        handle: &str,
        raw_password: &str,
        creator: &str,
    ) -> EngineResult<Account> {
        validate_handle(handle)?;
        self.policy
            .validate(raw_password)
            .map_err(|errors| EngineError::InvalidCredential(errors.join("; ")))?;

        // 散列放在事务外，避免让慢速散列占住写者
        let credential = password::hash(raw_password, self.bcrypt_cost)?;

        let mut txn = self.store.begin_write()?;

        let creator_account = txn
            .account(creator)?
            .ok_or_else(|| EngineError::NotFound(creator.to_string()))?;
        if !creator_account.role.can_create_accounts() {
            return Err(EngineError::Forbidden(format!(
                "角色 {} 无权创建账号",
                creator_account.role
            )));
        }

        // 引导规则：尚无管理员时，本次创建的账号成为首个管理员
        let role = if txn.count_by_role(Role::Admin)? == 0 {
            Role::Admin
        } else {
            Role::Member
        };

        let account = Account::new(handle, credential, role);
        txn.insert_account(&account)?;
        txn.insert_edge(&RelationEdge::new(creator, handle, EdgeKind::Created))?;
        if role == Role::Admin {
            txn.insert_edge(&RelationEdge::new(creator, handle, EdgeKind::Promoted))?;
        }
        txn.commit()?;

        log::info!("账号 {} 已由 {} 创建，角色 {}", handle, creator, role);
        Ok(account)
    }

    /// 按 handle 查询账号
    pub fn lookup(&self, handle: &str) -> EngineResult<Account> {
        let txn = self.store.begin_read()?;
        txn.account(handle)?
            .ok_or_else(|| EngineError::NotFound(handle.to_string()))
    }

    /// 列出账号，可按角色过滤；每次调用都是完整的快照
    pub fn list_accounts(&self, filter_role: Option<Role>) -> EngineResult<Vec<Account>> {
        let txn = self.store.begin_read()?;
        let mut accounts = txn.accounts()?;
        if let Some(role) = filter_role {
            accounts.retain(|a| a.role == role);
        }
        accounts.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(accounts)
    }

    /// 按角色统计账号数量
    pub fn count_by_role(&self, role: Role) -> EngineResult<usize> {
        let txn = self.store.begin_read()?;
        Ok(txn.count_by_role(role)?)
    }

    /// 删除账号并分离其全部关联边
    ///
    /// 仅管理员可删除；不能删除自己、不能删除引导账号；删除管理员
    /// 后剩余管理员数量不得低于下限。
    pub fn remove_account(&self, actor: &str, target: &str) -> EngineResult<()> {
        let mut txn = self.store.begin_write()?;

        let actor_account = txn
            .account(actor)?
            .ok_or_else(|| EngineError::NotFound(actor.to_string()))?;
        if !actor_account.role.is_admin() {
            return Err(EngineError::Forbidden(format!(
                "角色 {} 无权删除账号",
                actor_account.role
            )));
        }
        if actor == target {
            return Err(EngineError::InvalidState("不能删除自己".to_string()));
        }

        let target_account = txn
            .account(target)?
            .ok_or_else(|| EngineError::NotFound(target.to_string()))?;
        if target_account.role.is_seed() {
            return Err(EngineError::InvalidState(
                "引导账号不可删除".to_string(),
            ));
        }
        if target_account.role.is_admin() {
            let admins = txn.count_by_role(Role::Admin)?;
            if admins.saturating_sub(1) < self.min_admins {
                return Err(EngineError::InvalidState(format!(
                    "删除后管理员数量将低于下限 {}",
                    self.min_admins
                )));
            }
        }

        txn.delete_account(target)?;
        txn.commit()?;

        log::info!("账号 {} 已由 {} 删除", target, actor);
        Ok(())
    }

    /// 幂等地创建唯一的引导账号
    ///
    /// 引导账号在系统初始化时带外创建，不经过常规创建路径，也不受
    /// 密码复杂度策略约束（仅要求非空）。已存在同名引导账号时直接
    /// 返回它；handle 被其他角色占用时报告状态错误。
    pub fn ensure_seed(&self, handle: &str, raw_password: &str) -> EngineResult<Account> {
        validate_handle(handle)?;
        if raw_password.is_empty() {
            return Err(EngineError::InvalidCredential(
                "密码不能为空".to_string(),
            ));
        }

        let credential = password::hash(raw_password, self.bcrypt_cost)?;

        let mut txn = self.store.begin_write()?;

        if let Some(existing) = txn.account(handle)? {
            if existing.role.is_seed() {
                return Ok(existing);
            }
            return Err(EngineError::InvalidState(format!(
                "账号 {} 已存在且不是引导账号",
                handle
            )));
        }
        if txn.count_by_role(Role::Seed)? > 0 {
            return Err(EngineError::InvalidState(
                "引导账号已存在且只能有一个".to_string(),
            ));
        }

        let account = Account::new(handle, credential, Role::Seed);
        txn.insert_account(&account)?;
        txn.commit()?;

        log::info!("引导账号 {} 已创建", handle);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_handle() {
        assert!(validate_handle("alice").is_ok());
        assert!(validate_handle("a").is_ok());
        assert!(validate_handle("alice.b-c_d9").is_ok());

        assert!(validate_handle("").is_err());
        assert!(validate_handle(".alice").is_err(), "首字符必须为字母或数字");
        assert!(validate_handle("al ice").is_err());
        assert!(validate_handle("界面").is_err());
        assert!(validate_handle(&"x".repeat(65)).is_err());
    }
}
