//! 签名服务客户端
//!
//! 签名算法本身不在本项目内实现，只通过 `SigningOracle` 调用外部签名服务

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpRequest, HttpTransport};

/// 签名所属的接口族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignKind {
    /// druidv6 接口，签名头为 QDSign
    Qd,
    /// h5 接口，签名头为 SDKSign
    Sdk,
}

impl SignKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SignKind::Qd => "qd",
            SignKind::Sdk => "sdk",
        }
    }

    /// 签名对应的请求头名
    pub fn header_name(self) -> &'static str {
        match self {
            SignKind::Qd => "QDSign",
            SignKind::Sdk => "SDKSign",
        }
    }
}

/// 单次请求的签名上下文
#[derive(Debug, Clone)]
pub struct SignContext {
    /// 毫秒时间戳
    pub timestamp: String,
    /// 参与签名的数据（有请求体用请求体，否则用查询参数）
    pub body: Vec<(String, String)>,
    pub version: String,
    pub version_code: String,
    pub qid: String,
    pub user_id: String,
}

impl SignContext {
    pub fn body_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .body
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();
        JsonValue::Object(map)
    }
}

/// 签名服务
#[async_trait]
pub trait SigningOracle: Send + Sync {
    /// QDSign / SDKSign
    async fn sign(&self, kind: SignKind, ctx: &SignContext) -> AppResult<String>;

    /// 由初始 QDInfo 重算本次请求的 QDInfo
    async fn session_info(&self, timestamp: &str, raw_qdinfo: &str) -> AppResult<String>;

    /// borgus
    async fn device_assurance(&self, ctx: &SignContext) -> AppResult<String>;

    /// ibex（仅 sdk 请求）
    async fn device_integrity(&self, timestamp: &str, ibex_seed: &str) -> AppResult<String>;

    /// 从 QDInfo 中提取用户 ID
    async fn user_id(&self, raw_qdinfo: &str) -> AppResult<String>;
}

/// 通过 HTTP 调用的外部签名服务
///
/// 每个接口返回 `{"value": "..."}`
pub struct HttpSigningOracle {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl HttpSigningOracle {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    async fn call(&self, endpoint: &str, payload: JsonValue) -> AppResult<String> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let request = HttpRequest::post(&url)
            .json(payload)
            .timeout(Duration::from_secs(10));
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(AppError::oracle(
                "签名",
                format!("{} 返回状态码 {}", endpoint, response.status),
            ));
        }

        response
            .json()
            .and_then(|v| v.get("value").and_then(|s| s.as_str()).map(str::to_string))
            .ok_or_else(|| {
                AppError::oracle(
                    "签名",
                    format!("{} 返回格式错误: {}", endpoint, response.body),
                )
            })
    }
}

#[async_trait]
impl SigningOracle for HttpSigningOracle {
    async fn sign(&self, kind: SignKind, ctx: &SignContext) -> AppResult<String> {
        self.call(
            "sign",
            json!({
                "kind": kind.as_str(),
                "timestamp": ctx.timestamp,
                "body": ctx.body_json(),
                "version": ctx.version,
                "qid": ctx.qid,
                "userid": ctx.user_id,
            }),
        )
        .await
    }

    async fn session_info(&self, timestamp: &str, raw_qdinfo: &str) -> AppResult<String> {
        self.call(
            "qdinfo",
            json!({ "timestamp": timestamp, "QDInfo": raw_qdinfo }),
        )
        .await
    }

    async fn device_assurance(&self, ctx: &SignContext) -> AppResult<String> {
        self.call(
            "borgus",
            json!({
                "timestamp": ctx.timestamp,
                "body": ctx.body_json(),
                "versioncode": ctx.version_code,
                "qid": ctx.qid,
            }),
        )
        .await
    }

    async fn device_integrity(&self, timestamp: &str, ibex_seed: &str) -> AppResult<String> {
        self.call("ibex", json!({ "timestamp": timestamp, "ibex": ibex_seed }))
            .await
    }

    async fn user_id(&self, raw_qdinfo: &str) -> AppResult<String> {
        self.call("userid", json!({ "QDInfo": raw_qdinfo })).await
    }
}
