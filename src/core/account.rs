//! 账号节点类型
//!
//! 账号以 handle 为唯一键持久化在图存储中，密码仅保存 bcrypt 散列，
//! 明文在任何路径上都不落盘、不打日志。

use serde::{Deserialize, Serialize};

use crate::common::time;
use crate::core::Role;

/// 图中的账号节点
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// 唯一账号标识，创建后不可变，大小写敏感
    pub handle: String,
    /// bcrypt 散列后的凭据
    pub password_hash: String,
    /// 当前角色
    pub role: Role,
    /// 创建时间（epoch 毫秒）
    pub created_at: i64,
    /// 最近一次成功登录时间
    pub last_login_at: Option<i64>,
    /// 最近一次密码变更时间
    pub password_changed_at: i64,
}

impl Account {
    /// 以已散列的凭据构造账号节点
    pub fn new(handle: impl Into<String>, password_hash: String, role: Role) -> Self {
        let now = time::now_millis();
        Self {
            handle: handle.into(),
            password_hash,
            role,
            created_at: now,
            last_login_at: None,
            password_changed_at: now,
        }
    }
}

// 手动实现 Debug，凭据散列不进入任何格式化输出
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("handle", &self.handle)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_stamps_timestamps() {
        let account = Account::new("alice", "hash".to_string(), Role::Member);
        assert_eq!(account.handle, "alice");
        assert_eq!(account.role, Role::Member);
        assert!(account.created_at > 0);
        assert_eq!(account.created_at, account.password_changed_at);
        assert!(account.last_login_at.is_none());
    }

    #[test]
    fn test_debug_redacts_credential() {
        let account = Account::new("alice", "s3cret-hash".to_string(), Role::Member);
        let dump = format!("{:?}", account);
        assert!(!dump.contains("s3cret-hash"), "Debug 输出不能泄露凭据散列");
        assert!(dump.contains("alice"));
    }
}
