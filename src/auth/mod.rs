//! 凭据散列、凭据策略与会话认证

pub mod authenticator;
pub mod password;
pub mod policy;

pub use authenticator::SessionAuthenticator;
pub use policy::PasswordPolicy;
