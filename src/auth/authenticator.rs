//! 会话认证器
//!
//! 认证失败对调用方只暴露一种错误：未知账号与密码错误统一折叠为
//! `AuthenticationFailed`，并且两条失败路径都消耗一次 bcrypt 校验，
//! 防止通过错误类型或响应时延枚举账号。

use std::sync::{Arc, OnceLock};

use crate::auth::{password, PasswordPolicy};
use crate::common::time;
use crate::config::Config;
use crate::core::{Account, EngineError, EngineResult};
use crate::storage::GraphStore;

/// 未知账号路径使用的占位散列，进程内只计算一次
fn dummy_credential() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        password::hash("trustgraph:dummy-credential", bcrypt::DEFAULT_COST).unwrap_or_default()
    })
}

pub struct SessionAuthenticator {
    store: Arc<dyn GraphStore>,
    policy: PasswordPolicy,
    bcrypt_cost: u32,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        Self {
            store,
            policy: PasswordPolicy::from(&config.auth),
            bcrypt_cost: config.auth.bcrypt_cost,
        }
    }

    /// 认证登录尝试，成功时返回账号当前状态（含角色）
    ///
    /// 成功路径在同一事务内盖章 `last_login_at`。
    pub fn authenticate(&self, handle: &str, raw_password: &str) -> EngineResult<Account> {
        let mut txn = self.store.begin_write()?;

        match txn.account(handle)? {
            None => {
                // 未知账号也消耗一次校验，与密码错误路径等耗时
                let _ = password::verify(raw_password, dummy_credential());
                log::warn!("认证失败: 账号 {} 不存在", handle);
                Err(EngineError::AuthenticationFailed)
            }
            Some(mut account) => {
                if password::verify(raw_password, &account.password_hash) {
                    account.last_login_at = Some(time::now_millis());
                    txn.update_account(&account)?;
                    txn.commit()?;
                    log::info!("账号 {} 认证成功", account.handle);
                    Ok(account)
                } else {
                    log::warn!("认证失败: 账号 {} 密码错误", handle);
                    Err(EngineError::AuthenticationFailed)
                }
            }
        }
    }

    /// 修改密码
    ///
    /// 旧凭据校验失败与账号不存在同样折叠为 `AuthenticationFailed`；
    /// 新密码必须满足安全策略。
    pub fn change_password(
        &self,
        handle: &str,
        old_password: &str,
        new_password: &str,
    ) -> EngineResult<()> {
        self.policy
            .validate(new_password)
            .map_err(|errors| EngineError::InvalidCredential(errors.join("; ")))?;

        let mut txn = self.store.begin_write()?;

        let mut account = match txn.account(handle)? {
            Some(account) => account,
            None => {
                let _ = password::verify(old_password, dummy_credential());
                return Err(EngineError::AuthenticationFailed);
            }
        };

        if !password::verify(old_password, &account.password_hash) {
            log::warn!("修改密码失败: 账号 {} 旧密码校验未通过", handle);
            return Err(EngineError::AuthenticationFailed);
        }

        account.password_hash = password::hash(new_password, self.bcrypt_cost)?;
        account.password_changed_at = time::now_millis();
        txn.update_account(&account)?;
        txn.commit()?;

        log::info!("账号 {} 已修改密码", handle);
        Ok(())
    }
}
