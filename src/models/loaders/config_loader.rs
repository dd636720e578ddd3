use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as JsonValue;
use tokio::fs;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::account::{FileConfig, PushConfig, UserConfig};

/// 通过校验、可以执行任务的用户
#[derive(Debug, Clone)]
pub struct LoadedAccount {
    pub user: UserConfig,
    pub cookies: BTreeMap<String, String>,
    pub push_services: Vec<PushConfig>,
}

/// 读取并解析 TOML 主配置文件
pub async fn load_config_file(path: &Path) -> AppResult<FileConfig> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    parse_config(&content, &path.display().to_string())
}

pub fn parse_config(content: &str, path: &str) -> AppResult<FileConfig> {
    toml::from_str(content).map_err(|e| {
        ConfigError::ParseFailed {
            path: path.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// 读取 cookies JSON 文件（非字符串值会被转成字符串）
pub async fn load_cookies(path: &Path) -> AppResult<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    let raw: BTreeMap<String, JsonValue> =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(raw
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                JsonValue::String(s) => s,
                other => other.to_string(),
            };
            (k, value)
        })
        .collect())
}

/// 运行结束后写回 cookies
pub async fn save_cookies(path: &Path, cookies: &BTreeMap<String, String>) -> AppResult<()> {
    let content = serde_json::to_string_pretty(cookies).map_err(|e| ConfigError::ParseFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    fs::write(path, content)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;
    tracing::debug!("保存cookies成功: {}", path.display());
    Ok(())
}

/// 校验单个用户并加载其 cookies，失败的用户会被跳过
pub async fn load_accounts(config: &FileConfig) -> Vec<LoadedAccount> {
    let mut accounts = Vec::new();

    for user in &config.users {
        match load_account(user).await {
            Ok(account) => {
                tracing::info!(
                    "成功加载用户[{}]，推送服务 {} 个",
                    user.username,
                    account.push_services.len()
                );
                accounts.push(account);
            }
            Err(e) => {
                tracing::error!("{}，跳过该用户", e);
            }
        }
    }

    accounts
}

async fn load_account(user: &UserConfig) -> AppResult<LoadedAccount> {
    if user.username.trim().is_empty() {
        return Err(ConfigError::MissingField {
            username: "未知".to_string(),
            field: "username".to_string(),
        }
        .into());
    }

    let push_services = user
        .push_services
        .iter()
        .filter_map(|raw| match validate_push(&user.username, raw) {
            Ok(push) => Some(push),
            Err(e) => {
                tracing::warn!("{}，跳过该推送服务", e);
                None
            }
        })
        .collect::<Vec<_>>();

    let path = user.cookies_path();
    let cookies = load_cookies(Path::new(&path)).await?;
    if cookies.is_empty() {
        return Err(ConfigError::InvalidCookies {
            username: user.username.clone(),
            path,
            message: "文件为空".to_string(),
        }
        .into());
    }

    Ok(LoadedAccount {
        user: user.clone(),
        cookies,
        push_services,
    })
}

/// 校验单条推送配置
pub fn validate_push(username: &str, raw: &toml::Value) -> Result<PushConfig, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidPush {
        username: username.to_string(),
        message,
    };

    let push: PushConfig = raw
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| invalid(e.to_string()))?;

    match &push {
        PushConfig::Feishu {
            webhook_url,
            havesign,
            secret,
        } => {
            if webhook_url.trim().is_empty() {
                return Err(invalid("飞书推送缺少必要字段: webhook_url".to_string()));
            }
            if *havesign && secret.is_empty() {
                return Err(invalid("飞书推送启用签名校验但 secret 为空".to_string()));
            }
        }
        PushConfig::Serverchan { sckey } => {
            if sckey.trim().is_empty() {
                return Err(invalid("Server酱推送缺少必要字段: sckey".to_string()));
            }
        }
        PushConfig::Qiwei { webhook_url, .. } => {
            if webhook_url.trim().is_empty() {
                return Err(invalid("企业微信推送缺少必要字段: webhook_url".to_string()));
            }
        }
    }

    Ok(push)
}
