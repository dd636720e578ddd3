//! Server酱推送

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::warn;

use super::{send_for_json, PushChannel, PushReceipt};
use crate::error::AppResult;
use crate::infrastructure::{HttpRequest, HttpTransport};

pub struct ServerChan {
    sckey: String,
    transport: Arc<dyn HttpTransport>,
}

impl ServerChan {
    pub fn new(sckey: &str, transport: Arc<dyn HttpTransport>) -> Self {
        if !sckey.starts_with("SCU") {
            warn!("[ServerChan配置] sckey 格式可能不正确，通常以 SCU 开头");
        }
        Self {
            sckey: sckey.to_string(),
            transport,
        }
    }

    pub fn url(&self) -> String {
        format!("https://sc.ftqq.com/{}.send", self.sckey)
    }
}

#[async_trait]
impl PushChannel for ServerChan {
    fn name(&self) -> &str {
        "ServerChan"
    }

    async fn send(&self, title: &str, content: &str) -> AppResult<PushReceipt> {
        let request = HttpRequest::post(self.url()).form(vec![
            ("text".to_string(), title.to_string()),
            ("desp".to_string(), content.to_string()),
        ]);
        let raw = send_for_json(self.name(), self.transport.as_ref(), request).await?;

        let success = raw.get("errno").and_then(JsonValue::as_i64) == Some(0);
        Ok(PushReceipt { success, raw })
    }
}
