//! 验证码服务客户端
//!
//! 外部验证码服务的回复是三态的：`false`（服务端不支持该验证码）、
//! 空（无结果）、或带 code 的结果对象。三者在上报时含义不同，不能合并

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpRequest, HttpTransport};

/// 验证码服务返回的结果对象
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptchaReply {
    pub code: i64,
    #[serde(default)]
    pub randstr: Option<String>,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// 验证码服务的三态回复
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    /// 服务端明确表示不支持
    Unsupported,
    /// 无结果或格式错误
    Absent,
    Reply(CaptchaReply),
}

impl OracleReply {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Bool(false) => OracleReply::Unsupported,
            JsonValue::Object(_) => serde_json::from_value::<CaptchaReply>(value.clone())
                .map(OracleReply::Reply)
                .unwrap_or(OracleReply::Absent),
            _ => OracleReply::Absent,
        }
    }
}

/// 验证码服务
#[async_trait]
pub trait CaptchaOracle: Send + Sync {
    async fn solve(
        &self,
        tokenid: &str,
        captcha_a_id: &str,
        user_agent: &str,
    ) -> AppResult<OracleReply>;
}

/// 通过 HTTP 调用的外部验证码服务
pub struct HttpCaptchaOracle {
    url: String,
    transport: Arc<dyn HttpTransport>,
}

impl HttpCaptchaOracle {
    pub fn new(url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

#[async_trait]
impl CaptchaOracle for HttpCaptchaOracle {
    async fn solve(
        &self,
        tokenid: &str,
        captcha_a_id: &str,
        user_agent: &str,
    ) -> AppResult<OracleReply> {
        let request = HttpRequest::post(&self.url)
            .json(json!({
                "tokenid": tokenid,
                "captcha_a_id": captcha_a_id,
                "user_agent": user_agent,
            }))
            .timeout(Duration::from_secs(180));
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(AppError::oracle(
                "验证码",
                format!("返回状态码 {}", response.status),
            ));
        }

        Ok(response
            .json()
            .map(|v| OracleReply::from_json(&v))
            .unwrap_or(OracleReply::Absent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tri_state_reply() {
        assert_eq!(OracleReply::from_json(&json!(false)), OracleReply::Unsupported);
        assert_eq!(OracleReply::from_json(&JsonValue::Null), OracleReply::Absent);
        assert_eq!(OracleReply::from_json(&json!({"msg": 1})), OracleReply::Absent);
        assert_eq!(
            OracleReply::from_json(&json!({"code": 0, "randstr": "r", "ticket": "t"})),
            OracleReply::Reply(CaptchaReply {
                code: 0,
                randstr: Some("r".to_string()),
                ticket: Some("t".to_string()),
                message: None,
            })
        );
    }
}
