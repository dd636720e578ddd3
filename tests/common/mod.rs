//! 集成测试共用的脚本化替身
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use qidian_job::clients::{
    CaptchaOracle, CaptchaReply, OracleReply, QidianClient, SignContext, SignKind, SigningOracle,
};
use qidian_job::error::{AppError, AppResult};
use qidian_job::infrastructure::{
    HttpRequest, HttpResponse, HttpTransport, Pacer, RequestBody, Sleeper,
};
use qidian_job::models::account::{AccountSession, UserConfig};
use qidian_job::services::{CaptchaResolver, PushChannel, PushReceipt};

pub const TEST_UA: &str = "Mozilla/5.0 QDJSSDK/1.0 QDReaderAndroid/7.9.384/1466/1000032/OPPO/";
pub const FRESH_QDINFO: &str = "fresh-qdinfo";
pub const SUPPORTED_CAPTCHA: &str = "198420051";

pub fn json_response(body: JsonValue) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string(),
        ..Default::default()
    }
}

/// 被风控的响应
pub fn flagged(ban_id: JsonValue, captcha_a_id: &str) -> HttpResponse {
    json_response(json!({
        "Result": 0,
        "Data": {"RiskConf": {
            "BanId": ban_id,
            "CaptchaAId": captcha_a_id,
            "SessionKey": "risk-session",
            "BanMessage": "需要验证"
        }}
    }))
}

/// 按 URL 返回预设响应；队列只剩一个时重复返回它
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, url: &str, responses: Vec<HttpResponse>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into());
    }

    pub fn route_json(&self, url: &str, bodies: Vec<JsonValue>) {
        self.route(url, bodies.into_iter().map(json_response).collect());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests_to(url).len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&request.url)
            .ok_or_else(|| AppError::network(request.url.clone(), "no scripted route"))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| AppError::network(request.url.clone(), "empty route"))
    }
}

/// 表单字段
pub fn form_value<'a>(request: &'a HttpRequest, key: &str) -> Option<&'a str> {
    match &request.body {
        RequestBody::Form(pairs) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str()),
        _ => None,
    }
}

/// 固定返回值的签名服务
pub struct FakeSigner;

#[async_trait]
impl SigningOracle for FakeSigner {
    async fn sign(&self, kind: SignKind, _ctx: &SignContext) -> AppResult<String> {
        Ok(format!("{}-sign", kind.as_str()))
    }

    async fn session_info(&self, _timestamp: &str, _raw_qdinfo: &str) -> AppResult<String> {
        Ok(FRESH_QDINFO.to_string())
    }

    async fn device_assurance(&self, _ctx: &SignContext) -> AppResult<String> {
        Ok("borgus-value".to_string())
    }

    async fn device_integrity(&self, _timestamp: &str, _ibex_seed: &str) -> AppResult<String> {
        Ok("ibex-value".to_string())
    }

    async fn user_id(&self, _raw_qdinfo: &str) -> AppResult<String> {
        Ok("10001".to_string())
    }
}

/// 按顺序返回预设回复的验证码服务；回复用完后返回 `Absent`
#[derive(Default)]
pub struct ScriptedCaptchaOracle {
    replies: Mutex<VecDeque<OracleReply>>,
    repeat: Mutex<Option<OracleReply>>,
    calls: Mutex<Vec<String>>,
    unavailable: bool,
}

impl ScriptedCaptchaOracle {
    pub fn new(replies: Vec<OracleReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    /// 每次都返回同一个回复
    pub fn always(reply: OracleReply) -> Arc<Self> {
        Arc::new(Self {
            repeat: Mutex::new(Some(reply)),
            ..Default::default()
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CaptchaOracle for ScriptedCaptchaOracle {
    async fn solve(
        &self,
        tokenid: &str,
        captcha_a_id: &str,
        _user_agent: &str,
    ) -> AppResult<OracleReply> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", tokenid, captcha_a_id));
        if self.unavailable {
            return Err(AppError::oracle("验证码", "connection refused"));
        }
        if let Some(reply) = self.repeat.lock().unwrap().clone() {
            return Ok(reply);
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OracleReply::Absent))
    }
}

pub fn solved_reply() -> OracleReply {
    OracleReply::Reply(CaptchaReply {
        code: 0,
        randstr: Some("rand-str".to_string()),
        ticket: Some("ticket-value".to_string()),
        message: None,
    })
}

/// 记录所有等待、但不真正等待
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// 记录收到的消息
#[derive(Default)]
pub struct RecordingChannel {
    pub messages: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl PushChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, title: &str, content: &str) -> AppResult<PushReceipt> {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), content.to_string()));
        Ok(PushReceipt {
            success: true,
            raw: json!({"ok": true}),
        })
    }
}

/// 总是抛出异常的渠道
pub struct FailingChannel;

#[async_trait]
impl PushChannel for FailingChannel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn send(&self, _title: &str, _content: &str) -> AppResult<PushReceipt> {
        Err(AppError::push("failing", "webhook unreachable"))
    }
}

pub fn user_config(username: &str, tokenid: Option<&str>, tasks: &[&str]) -> UserConfig {
    UserConfig {
        username: username.to_string(),
        cookies_file: None,
        user_agent: TEST_UA.to_string(),
        ibex: "ibex-seed".to_string(),
        tokenid: tokenid.map(str::to_string),
        usertype: None,
        tasks: tasks.iter().map(|t| (t.to_string(), true)).collect(),
        push_services: Vec::new(),
    }
}

pub fn test_cookies() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("QDInfo".to_string(), "raw-qdinfo".to_string()),
        ("qid".to_string(), "qid-1".to_string()),
        ("ywguid".to_string(), "guid-1".to_string()),
    ])
}

/// 测试用的一套组件
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub sleeper: Arc<RecordingSleeper>,
    pub client: QidianClient,
}

impl Harness {
    pub async fn new(tokenid: Option<&str>, tasks: &[&str]) -> Self {
        let transport = ScriptedTransport::new();
        let sleeper = Arc::new(RecordingSleeper::default());
        let user = user_config("reader", tokenid, tasks);
        let session = AccountSession::new(&user, test_cookies(), TEST_UA).expect("session");
        let client = QidianClient::connect(
            session,
            transport.clone(),
            Arc::new(FakeSigner),
            Pacer::new(sleeper.clone()),
        )
        .await
        .expect("connect");

        Self {
            transport,
            sleeper,
            client,
        }
    }

    pub fn resolver(oracle: Arc<ScriptedCaptchaOracle>) -> CaptchaResolver {
        CaptchaResolver::new(oracle, 3)
    }
}
