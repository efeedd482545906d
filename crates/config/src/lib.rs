//! notes-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// 验证码 / 重置令牌配置
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: u32,
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: u32,
    #[serde(default = "default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    #[serde(default = "default_max_issuances_per_hour")]
    pub max_issuances_per_hour: u32,
    pub reset_link_base_url: String,
    /// 为空时不启动后台清理任务
    #[serde(default)]
    pub cleanup_interval_secs: Option<u64>,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
}

fn default_code_ttl_minutes() -> u32 {
    10
}

fn default_reset_token_ttl_minutes() -> u32 {
    60
}

fn default_max_failed_attempts() -> u32 {
    5
}

fn default_max_issuances_per_hour() -> u32 {
    5
}

fn default_retention_hours() -> u32 {
    24
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub database: Option<DatabaseConfig>,
    pub email: Option<EmailConfig>,
    pub verification: VerificationConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 合并顺序：`default.toml` → `{APP_ENV}.toml` → `NOTES_` 前缀环境变量
    /// （嵌套字段用 `__` 分隔，如 `NOTES_SERVER__PORT`）。
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let figment = Figment::from(Serialized::default("app_env", &env))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("NOTES_").split("__"));

        Self::from_figment(figment)
    }

    /// 从任意 Figment 提取并校验
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// 语义校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.verification;
        if v.code_ttl_minutes == 0 || v.reset_token_ttl_minutes == 0 {
            return Err(ConfigError::Invalid(
                "verification TTLs must be positive".to_string(),
            ));
        }
        if v.max_failed_attempts == 0 {
            return Err(ConfigError::Invalid(
                "verification.max_failed_attempts must be positive".to_string(),
            ));
        }
        if v.max_issuances_per_hour == 0 {
            return Err(ConfigError::Invalid(
                "verification.max_issuances_per_hour must be positive".to_string(),
            ));
        }
        if v.cleanup_interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "verification.cleanup_interval_secs must be positive when set".to_string(),
            ));
        }
        if self.is_production() && self.email.is_none() {
            return Err(ConfigError::Invalid(
                "an [email] transport is required in production".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
