//! 账号配置与运行期会话

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::task::TaskKind;

/// 配置文件顶层的全局设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalSettings {
    pub default_user_agent: Option<String>,
    pub retry_attempts: Option<i64>,
    pub captcha_max_attempts: Option<i64>,
    pub log_level: Option<String>,
    pub save_cookies: Option<bool>,
    pub signing_oracle_url: Option<String>,
    pub captcha_oracle_url: Option<String>,
}

/// 配置文件整体结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub settings: GlobalSettings,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// 单个用户的配置
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    #[serde(default)]
    pub cookies_file: Option<String>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub ibex: String,
    #[serde(default)]
    pub tokenid: Option<String>,
    #[serde(default)]
    pub usertype: Option<String>,
    #[serde(default)]
    pub tasks: BTreeMap<String, bool>,
    /// 原始推送配置，加载时逐项校验
    #[serde(default)]
    pub push_services: Vec<toml::Value>,
}

impl UserConfig {
    /// cookies 文件路径（未配置时为 cookies/<username>.json）
    pub fn cookies_path(&self) -> String {
        self.cookies_file
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| format!("cookies/{}.json", self.username))
    }
}

/// 推送服务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushConfig {
    /// 飞书机器人
    Feishu {
        webhook_url: String,
        #[serde(default)]
        havesign: bool,
        #[serde(default)]
        secret: String,
    },
    /// Server酱
    Serverchan { sckey: String },
    /// 企业微信机器人
    Qiwei {
        webhook_url: String,
        #[serde(default)]
        user_id: String,
    },
}

/// 从 UA 中解析 (版本号, 版本编号)
pub fn parse_version(user_agent: &str) -> Option<(String, String)> {
    static UA_VERSION: OnceLock<Regex> = OnceLock::new();
    let re = UA_VERSION.get_or_init(|| {
        Regex::new(r"QDReaderAndroid/(\d+\.\d+\.\d+)/(\d+)/").expect("UA 正则无效")
    });
    let caps = re.captures(user_agent)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// 账号运行期会话
///
/// cookies 在整个运行期间被原地修改（每次签名请求都会重算 QDInfo）
#[derive(Debug)]
pub struct AccountSession {
    pub username: String,
    pub user_agent: String,
    /// 协议版本号，如 7.9.384
    pub version: String,
    /// 版本编号，如 1466
    pub version_code: String,
    pub qid: String,
    /// 初始 QDInfo，每次重算都以它为种子
    pub raw_qdinfo: String,
    /// 设备完整性种子
    pub ibex: String,
    /// 验证码服务授权令牌
    pub tokenid: Option<String>,
    pub usertype: Option<String>,
    tasks: BTreeMap<String, bool>,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl AccountSession {
    /// 根据用户配置和 cookies 构建会话
    pub fn new(
        user: &UserConfig,
        cookies: BTreeMap<String, String>,
        default_user_agent: &str,
    ) -> AppResult<Self> {
        let user_agent = if user.user_agent.trim().is_empty() {
            default_user_agent.to_string()
        } else {
            user.user_agent.clone()
        };
        debug!("用户[{}] 使用的User-Agent: {}", user.username, user_agent);

        let (version, version_code) = parse_version(&user_agent).ok_or_else(|| {
            AppError::Session(format!(
                "用户[{}] 无法匹配User-Agent格式，请检查UA内容",
                user.username
            ))
        })?;
        debug!("当前UA版本：{} / {}", version, version_code);

        if user.ibex.is_empty() {
            warn!("用户[{}] ibex未配置，可能会导致验证码问题", user.username);
        }

        let qid = cookies.get("qid").cloned().unwrap_or_default();
        let raw_qdinfo = cookies.get("QDInfo").cloned().unwrap_or_default();

        Ok(Self {
            username: user.username.clone(),
            user_agent,
            version,
            version_code,
            qid,
            raw_qdinfo,
            ibex: user.ibex.clone(),
            tokenid: user.tokenid.clone().filter(|t| !t.trim().is_empty()),
            usertype: user.usertype.clone(),
            tasks: user.tasks.clone(),
            cookies: Mutex::new(cookies),
        })
    }

    fn cookies_guard(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_cookie(&self, key: &str, value: impl Into<String>) {
        self.cookies_guard().insert(key.to_string(), value.into());
    }

    pub fn cookie(&self, key: &str) -> Option<String> {
        self.cookies_guard().get(key).cloned()
    }

    /// 当前 cookies 的快照
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.cookies_guard().clone()
    }

    /// 任务是否启用（未配置视为禁用）
    pub fn is_enabled(&self, kind: TaskKind) -> bool {
        self.tasks
            .iter()
            .any(|(name, enabled)| *enabled && TaskKind::from_config_key(name) == Some(kind))
    }
}

/// 把 cookies 拼成 Cookie 请求头
pub fn cookie_header(cookies: &BTreeMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    fn user(ua: &str) -> UserConfig {
        UserConfig {
            username: "测试用户".to_string(),
            cookies_file: None,
            user_agent: ua.to_string(),
            ibex: "ibex-seed".to_string(),
            tokenid: Some("  ".to_string()),
            usertype: None,
            tasks: BTreeMap::from([
                ("签到任务".to_string(), true),
                ("每日抽奖任务".to_string(), false),
            ]),
            push_services: Vec::new(),
        }
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version(DEFAULT_USER_AGENT),
            Some(("7.9.384".to_string(), "1466".to_string()))
        );
        assert_eq!(parse_version("Mozilla/5.0 Chrome/109"), None);
    }

    #[test]
    fn test_session_from_config() {
        let cookies = BTreeMap::from([
            ("qid".to_string(), "q-1".to_string()),
            ("QDInfo".to_string(), "raw-info".to_string()),
        ]);
        let session = AccountSession::new(&user(""), cookies, DEFAULT_USER_AGENT).unwrap();

        assert_eq!(session.version, "7.9.384");
        assert_eq!(session.qid, "q-1");
        assert_eq!(session.raw_qdinfo, "raw-info");
        assert_eq!(session.tokenid, None);
        assert!(session.is_enabled(TaskKind::CheckIn));
        assert!(!session.is_enabled(TaskKind::Lottery));
        assert!(!session.is_enabled(TaskKind::Game));

        session.set_cookie("QDInfo", "fresh");
        assert_eq!(session.cookie("QDInfo").as_deref(), Some("fresh"));
        assert_eq!(session.raw_qdinfo, "raw-info");
        assert_eq!(cookie_header(&session.cookies()), "QDInfo=fresh; qid=q-1");
    }

    #[test]
    fn test_bad_user_agent_rejected() {
        let err = AccountSession::new(&user("Mozilla/5.0"), BTreeMap::new(), "").unwrap_err();
        assert!(matches!(err, AppError::Session(_)));
    }

    #[test]
    fn test_push_config_tagged() {
        let value: toml::Value = toml::from_str(
            r#"
            type = "qiwei"
            webhook_url = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=k"
            "#,
        )
        .unwrap();
        let push: PushConfig = value.try_into().unwrap();
        assert_eq!(
            push,
            PushConfig::Qiwei {
                webhook_url: "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=k".to_string(),
                user_id: String::new(),
            }
        );
    }
}
