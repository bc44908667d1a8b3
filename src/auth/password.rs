//! 密码散列与校验
//!
//! 使用 bcrypt（加盐、慢速、自适应），工作因子可配置但不低于库默认值。

use crate::core::{EngineError, EngineResult};

/// 散列明文密码
///
/// 工作因子低于 `bcrypt::DEFAULT_COST` 时按默认值执行，超出 bcrypt
/// 上限时按上限执行。
pub fn hash(raw_password: &str, cost: u32) -> EngineResult<String> {
    let cost = cost.clamp(bcrypt::DEFAULT_COST, 31);
    bcrypt::hash(raw_password, cost)
        .map_err(|e| EngineError::Internal(format!("密码散列失败: {}", e)))
}

/// 校验明文密码与存储的散列是否匹配
///
/// 散列格式非法时返回 false 而不是报错；bcrypt 内部比较是常数时间的。
pub fn verify(raw_password: &str, credential: &str) -> bool {
    bcrypt::verify(raw_password, credential).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let credential = hash(password, bcrypt::DEFAULT_COST).expect("散列失败");

        assert!(credential.starts_with("$2"), "应为 bcrypt 格式");
        assert!(verify(password, &credential));
        assert!(!verify("wrong-password", &credential));
    }

    #[test]
    fn test_different_salts() {
        let password = "same-password";
        let first = hash(password, bcrypt::DEFAULT_COST).expect("散列失败");
        let second = hash(password, bcrypt::DEFAULT_COST).expect("散列失败");

        // 相同密码因盐不同而散列不同
        assert_ne!(first, second);
        assert!(verify(password, &first));
        assert!(verify(password, &second));
    }

    #[test]
    fn test_verify_malformed_credential_returns_false() {
        assert!(!verify("password", "not-a-valid-hash"));
        assert!(!verify("password", ""));
    }

    #[test]
    fn test_cost_floor() {
        // 过低的工作因子被抬升到默认值，散列仍然可校验
        let credential = hash("password", 1).expect("散列失败");
        assert!(verify("password", &credential));
    }
}
