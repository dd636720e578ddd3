//! 推送渠道
//!
//! 每种渠道一个实现，统一通过 `PushChannel::send` 调用

pub mod feishu;
pub mod qiwei;
pub mod serverchan;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpRequest, HttpTransport};
use crate::models::account::PushConfig;

pub use feishu::FeiShu;
pub use qiwei::Qiwei;
pub use serverchan::ServerChan;

/// 单次推送超时
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// 推送回执
#[derive(Debug, Clone, PartialEq)]
pub struct PushReceipt {
    pub success: bool,
    pub raw: JsonValue,
}

/// 推送渠道
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// 渠道名（用于日志）
    fn name(&self) -> &str;

    async fn send(&self, title: &str, content: &str) -> AppResult<PushReceipt>;
}

/// 根据配置创建推送渠道
pub fn build_channel(
    config: &PushConfig,
    transport: Arc<dyn HttpTransport>,
) -> AppResult<Box<dyn PushChannel>> {
    Ok(match config {
        PushConfig::Feishu {
            webhook_url,
            havesign,
            secret,
        } => Box::new(FeiShu::new(webhook_url, *havesign, secret, transport)?),
        PushConfig::Serverchan { sckey } => Box::new(ServerChan::new(sckey, transport)),
        PushConfig::Qiwei {
            webhook_url,
            user_id,
        } => Box::new(Qiwei::new(webhook_url, user_id, transport)),
    })
}

/// 发送请求并把回复解析为 JSON（非 2xx 视为错误）
pub(crate) async fn send_for_json(
    channel: &str,
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> AppResult<JsonValue> {
    let url = request.url.clone();
    let response = transport.send(request.timeout(PUSH_TIMEOUT)).await?;

    if !response.is_success() {
        return Err(AppError::BadStatus {
            endpoint: url,
            status: response.status,
        });
    }

    response.json().ok_or_else(|| {
        AppError::push(channel, format!("返回内容不是 JSON: {}", response.body))
    })
}
