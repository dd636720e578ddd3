//! 飞书机器人推送

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{json, Value as JsonValue};
use sha2::Sha256;
use tracing::{debug, warn};

use super::{send_for_json, PushChannel, PushReceipt};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpRequest, HttpTransport};

const OFFICIAL_PREFIX: &str = "https://open.feishu.cn/open-apis/bot/v2/hook/";

pub struct FeiShu {
    webhook_url: String,
    havesign: bool,
    secret: String,
    transport: Arc<dyn HttpTransport>,
}

impl FeiShu {
    pub fn new(
        webhook_url: &str,
        havesign: bool,
        secret: &str,
        transport: Arc<dyn HttpTransport>,
    ) -> AppResult<Self> {
        if !webhook_url.starts_with(OFFICIAL_PREFIX) {
            warn!("[飞书配置] webhook_url 格式不推荐，建议使用飞书官方webhook地址");
        }
        if havesign && secret.is_empty() {
            return Err(AppError::push("飞书", "启用签名校验必须提供secret"));
        }

        Ok(Self {
            webhook_url: webhook_url.to_string(),
            havesign,
            secret: secret.to_string(),
            transport,
        })
    }

    /// 卡片消息
    pub fn card(title: &str, content: &str) -> JsonValue {
        json!({
            "config": {"update_multi": true},
            "elements": [{
                "tag": "markdown",
                "content": content,
                "text_align": "left",
                "text_size": "normal",
            }],
            "header": {
                "title": {"tag": "plain_text", "content": title},
                "template": "blue",
            },
        })
    }

    /// 构造请求体，`timestamp` 为秒级时间戳
    pub fn payload(&self, title: &str, content: &str, timestamp: i64) -> AppResult<JsonValue> {
        let mut payload = json!({
            "msg_type": "interactive",
            "card": Self::card(title, content),
        });
        if self.havesign {
            payload["sign"] = json!(gen_sign(timestamp, &self.secret)?);
            payload["timestamp"] = json!(timestamp);
        }
        Ok(payload)
    }
}

/// 飞书签名：以 "timestamp\nsecret" 为密钥对空消息做 HMAC-SHA256，再 base64
pub fn gen_sign(timestamp: i64, secret: &str) -> AppResult<String> {
    let string_to_sign = format!("{}\n{}", timestamp, secret);
    let mac = Hmac::<Sha256>::new_from_slice(string_to_sign.as_bytes())
        .map_err(|e| AppError::push("飞书", format!("签名初始化失败: {}", e)))?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl PushChannel for FeiShu {
    fn name(&self) -> &str {
        "飞书"
    }

    async fn send(&self, title: &str, content: &str) -> AppResult<PushReceipt> {
        let timestamp = chrono::Utc::now().timestamp();
        let payload = self.payload(title, content, timestamp)?;

        let request = HttpRequest::post(&self.webhook_url).json(payload);
        let raw = send_for_json(self.name(), self.transport.as_ref(), request).await?;

        let success = raw.get("code").and_then(JsonValue::as_i64) == Some(0);
        if !success {
            debug!("[飞书推送] 返回异常: {}", raw);
        }
        Ok(PushReceipt { success, raw })
    }
}
