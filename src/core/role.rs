//! 角色类型定义
//!
//! 提供核心的三级角色模型

use serde::{Deserialize, Serialize};

/// 3级角色模型
/// - Seed: 唯一的引导账号，仅用于创建账号，自身永不升降级
/// - Admin: 管理员，可以创建账号、提升成员、对其他管理员的降级投票
/// - Member: 普通成员，默认角色，无管理权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Seed,
    Admin,
    Member,
}

impl Role {
    /// 检查角色是否可以创建账号
    pub fn can_create_accounts(&self) -> bool {
        matches!(self, Role::Seed | Role::Admin)
    }

    /// 检查是否为管理员
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// 检查是否为引导账号
    pub fn is_seed(&self) -> bool {
        matches!(self, Role::Seed)
    }

    /// 从字符串解析角色类型
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SEED" => Some(Role::Seed),
            "ADMIN" => Some(Role::Admin),
            "MEMBER" => Some(Role::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Seed => write!(f, "SEED"),
            Role::Admin => write!(f, "ADMIN"),
            Role::Member => write!(f, "MEMBER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Seed.can_create_accounts());
        assert!(Role::Admin.can_create_accounts());
        assert!(!Role::Member.can_create_accounts());

        assert!(Role::Admin.is_admin());
        assert!(!Role::Seed.is_admin(), "引导账号不计入管理员");
        assert!(!Role::Member.is_admin());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Seed, Role::Admin, Role::Member] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("god"), None);
    }
}
