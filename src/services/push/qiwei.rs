//! 企业微信机器人推送

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use super::{send_for_json, PushChannel, PushReceipt};
use crate::error::AppResult;
use crate::infrastructure::{HttpRequest, HttpTransport};

pub struct Qiwei {
    webhook_url: String,
    user_id: String,
    transport: Arc<dyn HttpTransport>,
}

impl Qiwei {
    pub fn new(webhook_url: &str, user_id: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
            user_id: user_id.to_string(),
            transport,
        }
    }

    /// markdown 消息内容，配置了 user_id 时 @ 对应成员
    pub fn markdown(&self, title: &str, content: &str) -> String {
        let mention = if self.user_id.is_empty() {
            String::new()
        } else {
            format!("<@{}>", self.user_id)
        };
        format!("## {} \n {}\n\n{}", title, mention, content)
    }
}

#[async_trait]
impl PushChannel for Qiwei {
    fn name(&self) -> &str {
        "Qiwei"
    }

    async fn send(&self, title: &str, content: &str) -> AppResult<PushReceipt> {
        let payload = json!({
            "msgtype": "markdown",
            "markdown": {"content": self.markdown(title, content)},
        });
        let request = HttpRequest::post(&self.webhook_url).json(payload);
        let raw = send_for_json(self.name(), self.transport.as_ref(), request).await?;

        let success = raw.get("errcode").and_then(JsonValue::as_i64) == Some(0);
        Ok(PushReceipt { success, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::infrastructure::HttpResponse;

    struct NoTransport;

    #[async_trait]
    impl HttpTransport for NoTransport {
        async fn send(&self, request: HttpRequest) -> AppResult<HttpResponse> {
            Err(AppError::network(request.url, "offline"))
        }
    }

    #[test]
    fn test_markdown_mention() {
        let with_user = Qiwei::new(
            "https://qyapi.weixin.qq.com/x",
            "zhangsan",
            Arc::new(NoTransport),
        );
        assert_eq!(with_user.markdown("标题", "内容"), "## 标题 \n <@zhangsan>\n\n内容");

        let without_user = Qiwei::new("https://qyapi.weixin.qq.com/x", "", Arc::new(NoTransport));
        assert_eq!(without_user.markdown("标题", "内容"), "## 标题 \n \n\n内容");
    }
}
