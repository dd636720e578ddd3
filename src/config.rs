use std::str::FromStr;

use tracing::warn;

use crate::models::account::GlobalSettings;

/// 起点客户端默认 UA（需包含 QDReaderAndroid/<版本>/<版本编号>/）
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13; PDEM10 Build/TP1A.220905.001; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/109.0.5414.86 MQQBrowser/6.2 TBS/047601 Mobile Safari/537.36 QDJSSDK/1.0  QDNightStyle_1  QDReaderAndroid/7.9.384/1466/1000032/OPPO/QDShowNativeLoading";

const VALID_LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 主配置文件路径
    pub config_path: String,
    /// 未单独配置 UA 的用户使用的 UA
    pub default_user_agent: String,
    /// 单个任务的最大尝试次数
    pub retry_attempts: usize,
    /// 单次请求内验证码的最大求解次数
    pub captcha_max_attempts: usize,
    /// 日志级别（DEBUG / INFO / WARNING / ERROR / CRITICAL）
    pub log_level: String,
    /// 运行结束后是否把 cookies 写回文件
    pub save_cookies: bool,
    // --- 外部服务 ---
    pub signing_oracle_url: String,
    pub captcha_oracle_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: "config.toml".to_string(),
            default_user_agent: DEFAULT_USER_AGENT.to_string(),
            retry_attempts: 3,
            captcha_max_attempts: 3,
            log_level: "INFO".to_string(),
            save_cookies: false,
            signing_oracle_url: "http://127.0.0.1:8964".to_string(),
            captcha_oracle_url: "http://127.0.0.1:8965/solve".to_string(),
        }
    }
}

impl Config {
    /// 仅从环境变量读取（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 默认值 ← 配置文件 ← 环境变量
    pub fn resolve(settings: &GlobalSettings) -> Self {
        let mut config = Self::from_env_path();

        if let Some(ua) = settings.default_user_agent.as_deref() {
            if ua.trim().is_empty() {
                warn!("默认User-Agent配置错误，使用默认值");
            } else {
                config.default_user_agent = ua.to_string();
            }
        }
        if let Some(attempts) = settings.retry_attempts {
            config.retry_attempts = positive_or_default(attempts, 3, "重试次数");
        }
        if let Some(attempts) = settings.captcha_max_attempts {
            config.captcha_max_attempts = positive_or_default(attempts, 3, "验证码尝试次数");
        }
        if let Some(level) = settings.log_level.as_deref() {
            config.log_level = level.to_string();
        }
        if let Some(save) = settings.save_cookies {
            config.save_cookies = save;
        }
        if let Some(url) = settings.signing_oracle_url.as_deref() {
            config.signing_oracle_url = url.to_string();
        }
        if let Some(url) = settings.captcha_oracle_url.as_deref() {
            config.captcha_oracle_url = url.to_string();
        }

        let mut config = config.with_env_overrides();
        config.log_level = normalize_log_level(&config.log_level);
        config
    }

    fn from_env_path() -> Self {
        let default = Self::default();
        Self {
            config_path: std::env::var("QIDIAN_CONFIG").unwrap_or(default.config_path.clone()),
            ..default
        }
    }

    fn with_env_overrides(self) -> Self {
        Self {
            config_path: std::env::var("QIDIAN_CONFIG").unwrap_or(self.config_path),
            retry_attempts: env_or("RETRY_ATTEMPTS", self.retry_attempts),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(self.log_level),
            signing_oracle_url: std::env::var("SIGNING_ORACLE_URL")
                .unwrap_or(self.signing_oracle_url),
            captcha_oracle_url: std::env::var("CAPTCHA_ORACLE_URL")
                .unwrap_or(self.captcha_oracle_url),
            ..self
        }
    }

    /// 转换为 tracing 的过滤级别
    pub fn tracing_level(&self) -> &'static str {
        match self.log_level.as_str() {
            "DEBUG" => "debug",
            "WARNING" => "warn",
            "ERROR" | "CRITICAL" => "error",
            _ => "info",
        }
    }
}

fn env_or<T: FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn positive_or_default(value: i64, default: usize, label: &str) -> usize {
    if value <= 0 {
        warn!("{}配置错误，使用默认值 {} 次", label, default);
        default
    } else {
        value as usize
    }
}

fn normalize_log_level(level: &str) -> String {
    let upper = level.trim().to_uppercase();
    if VALID_LOG_LEVELS.contains(&upper.as_str()) {
        upper
    } else {
        warn!(
            "日志级别配置错误，使用默认级别 INFO。有效值: {}",
            VALID_LOG_LEVELS.join(", ")
        );
        "INFO".to_string()
    }
}
