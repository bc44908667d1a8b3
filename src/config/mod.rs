use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 应用配置，按关注点分节
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            auth: AuthConfig::default(),
            consensus: ConsensusConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 存储后端配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// 后端类型: "memory" 或 "redb"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// redb 数据库文件路径
    #[serde(default = "default_store_path")]
    pub path: String,
    /// 内存后端写事务获取超时（毫秒），超时返回写冲突
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

/// 认证与凭据策略配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// bcrypt 工作因子，低于库默认值时按默认值执行
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// 密码最小长度
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_true")]
    pub require_lowercase: bool,
    #[serde(default = "default_true")]
    pub require_uppercase: bool,
    #[serde(default = "default_true")]
    pub require_digit: bool,
    #[serde(default = "default_true")]
    pub require_special: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
            min_password_length: default_min_password_length(),
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// 角色共识规则配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConsensusConfig {
    /// 执行降级所需的最少不同管理员票数
    #[serde(default = "default_demotion_quorum")]
    pub demotion_quorum: usize,
    /// 任何操作后必须保留的最少管理员数量（引导账号不计入）
    #[serde(default = "default_min_admins")]
    pub min_admins: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            demotion_quorum: default_demotion_quorum(),
            min_admins: default_min_admins(),
        }
    }
}

/// 日志配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_max_log_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file: default_log_file(),
            max_file_size: default_max_log_file_size(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_store_path() -> String {
    "data/trustgraph.redb".to_string()
}

fn default_write_timeout_ms() -> u64 {
    5000
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_min_password_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_demotion_quorum() -> usize {
    2
}

fn default_min_admins() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file() -> String {
    "trustgraph".to_string()
}

fn default_max_log_file_size() -> u64 {
    100 * 1024 * 1024 // 100MB
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
