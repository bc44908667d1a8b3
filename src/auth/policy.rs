//! 密码安全策略
//!
//! 最小长度加四类字符要求，各项可单独开关。

use std::sync::OnceLock;

use regex::Regex;

use crate::config::AuthConfig;

fn lowercase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z]").expect("合法的正则"))
}

fn uppercase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]").expect("合法的正则"))
}

fn digit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d").expect("合法的正则"))
}

fn special_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("合法的正则"))
}

/// 密码策略
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl From<&AuthConfig> for PasswordPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self {
            min_length: config.min_password_length,
            require_lowercase: config.require_lowercase,
            require_uppercase: config.require_uppercase,
            require_digit: config.require_digit,
            require_special: config.require_special,
        }
    }
}

impl PasswordPolicy {
    /// 校验密码，返回全部违反项
    pub fn validate(&self, password: &str) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if password.is_empty() {
            errors.push("密码不能为空".to_string());
            return Err(errors);
        }

        if password.chars().count() < self.min_length {
            errors.push(format!("密码长度不能少于 {} 个字符", self.min_length));
        }

        if self.require_lowercase && !lowercase_re().is_match(password) {
            errors.push("密码必须包含至少一个小写字母".to_string());
        }

        if self.require_uppercase && !uppercase_re().is_match(password) {
            errors.push("密码必须包含至少一个大写字母".to_string());
        }

        if self.require_digit && !digit_re().is_match(password) {
            errors.push("密码必须包含至少一个数字".to_string());
        }

        if self.require_special && !special_re().is_match(password) {
            errors.push("密码必须包含至少一个特殊字符".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Str0ng!pass").is_ok());
    }

    #[test]
    fn test_too_short() {
        let policy = PasswordPolicy::default();
        let errors = policy.validate("S1!a").unwrap_err();
        assert!(errors.iter().any(|e| e.contains("长度")));
    }

    #[test]
    fn test_empty_password_short_circuits() {
        let policy = PasswordPolicy::default();
        let errors = policy.validate("").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("不能为空"));
    }

    #[test]
    fn test_missing_character_classes_accumulate() {
        let policy = PasswordPolicy::default();
        let errors = policy.validate("alllowercase").unwrap_err();
        assert!(errors.len() >= 3, "大写、数字、特殊字符应同时报告: {:?}", errors);
    }

    #[test]
    fn test_relaxed_policy() {
        let policy = PasswordPolicy {
            min_length: 4,
            require_lowercase: false,
            require_uppercase: false,
            require_digit: false,
            require_special: false,
        };
        assert!(policy.validate("abcd").is_ok());
    }
}
