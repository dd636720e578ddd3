/// 起点 API 客户端
///
/// 封装签名、cookies 维护与风控检测，所有任务流程都经由这里发请求
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use crate::clients::endpoints;
use crate::clients::signing::{SignContext, SignKind, SigningOracle};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Pacer};
use crate::models::account::{cookie_header, AccountSession};
use crate::models::risk::ApiResponse;

const SDK_HEADERS: [(&str, &str); 11] = [
    ("Accept", "application/json, text/plain, */*"),
    ("helios", "1"),
    ("Origin", "https://h5.if.qidian.com"),
    ("X-Requested-With", "com.qidian.QDReader"),
    ("Sec-Fetch-Site", "same-origin"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Dest", "empty"),
    (
        "Referer",
        "https://h5.if.qidian.com/h5/adv-develop/entry2?_viewmode=0&jump=zhanghu",
    ),
    (
        "Accept-Language",
        "zh-CN,zh-TW;q=0.9,zh;q=0.8,en-US;q=0.7,en;q=0.6",
    ),
    ("Connection", "keep-alive"),
    ("Host", "h5.if.qidian.com"),
];

const QD_HEADERS: [(&str, &str); 4] = [
    ("Cache-Control", "max-stale=0"),
    ("Connection", "Keep-Alive"),
    ("Accept-Encoding", "gzip"),
    ("Host", "druidv6.if.qidian.com"),
];

const GAME_HEADERS: [(&str, &str); 8] = [
    ("Accept", "application/json, text/plain, */*"),
    ("Origin", "https://qdgame.qidian.com"),
    ("X-Requested-With", "com.qidian.QDReader"),
    ("Sec-Fetch-Site", "same-site"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Dest", "empty"),
    ("Referer", "https://qdgame.qidian.com/"),
    ("Accept-Language", "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
];

/// 起点 API 客户端
pub struct QidianClient {
    session: AccountSession,
    user_id: String,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn SigningOracle>,
    pacer: Pacer,
}

impl QidianClient {
    /// 创建客户端，并通过签名服务解析用户 ID
    pub async fn connect(
        session: AccountSession,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn SigningOracle>,
        pacer: Pacer,
    ) -> AppResult<Self> {
        let user_id = signer.user_id(&session.raw_qdinfo).await?;
        debug!("userid：{}", user_id);

        Ok(Self {
            session,
            user_id,
            transport,
            signer,
            pacer,
        })
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// h5 (sdk) 类型请求
    pub async fn sdk_request(
        &self,
        url: &str,
        params: &[(&str, &str)],
        body: &[(&str, &str)],
        method: HttpMethod,
    ) -> AppResult<ApiResponse> {
        self.signed_request(SignKind::Sdk, url, params, body, method)
            .await
    }

    /// druidv6 (qd) 类型请求
    pub async fn qd_request(
        &self,
        url: &str,
        params: &[(&str, &str)],
        body: &[(&str, &str)],
        method: HttpMethod,
    ) -> AppResult<ApiResponse> {
        self.signed_request(SignKind::Qd, url, params, body, method)
            .await
    }

    async fn signed_request(
        &self,
        kind: SignKind,
        url: &str,
        params: &[(&str, &str)],
        body: &[(&str, &str)],
        method: HttpMethod,
    ) -> AppResult<ApiResponse> {
        self.pacer.before_request().await;

        let params = owned_pairs(params);
        let body = owned_pairs(body);
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();

        let ctx = SignContext {
            timestamp: timestamp.clone(),
            body: if body.is_empty() {
                params.clone()
            } else {
                body.clone()
            },
            version: self.session.version.clone(),
            version_code: self.session.version_code.clone(),
            qid: self.session.qid.clone(),
            user_id: self.user_id.clone(),
        };

        let signature = self.signer.sign(kind, &ctx).await?;
        let qdinfo = self
            .signer
            .session_info(&timestamp, &self.session.raw_qdinfo)
            .await?;
        let borgus = self.signer.device_assurance(&ctx).await?;

        let base_headers: &[(&str, &str)] = match kind {
            SignKind::Sdk => &SDK_HEADERS,
            SignKind::Qd => &QD_HEADERS,
        };
        let mut request = HttpRequest::new(method, url)
            .query(&params)
            .header("User-Agent", self.session.user_agent.as_str())
            .header("tstamp", timestamp.as_str())
            .header(kind.header_name(), signature)
            .header("borgus", borgus);
        for (name, value) in base_headers {
            request = request.header(*name, *value);
        }
        request = match kind {
            SignKind::Sdk => {
                let ibex = self
                    .signer
                    .device_integrity(&timestamp, &self.session.ibex)
                    .await?;
                request.header("ibex", ibex)
            }
            SignKind::Qd => request.header("QDInfo", qdinfo.as_str()),
        };

        // 服务端要求 cookies 中的 QDInfo 与本次重算的值一致
        self.session.set_cookie("QDInfo", qdinfo);
        request = request.header("Cookie", cookie_header(&self.session.cookies()));

        if method == HttpMethod::Post {
            request = request.form(body);
        }

        let response = self.transport.send(request).await?;
        for (name, value) in &response.set_cookies {
            self.session.set_cookie(name, value.clone());
        }
        parse_api_response(kind, url, &response)
    }

    /// 检查登录状态，返回昵称
    pub async fn check_login(&self) -> Option<String> {
        match self
            .qd_request(endpoints::PROFILE, &[], &[], HttpMethod::Get)
            .await
        {
            Ok(response) => response
                .pointer("/Data/Nickname")
                .and_then(JsonValue::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            Err(e) => {
                error!("登录检测异常: {}", e);
                None
            }
        }
    }

    /// 获取福利中心任务列表
    pub async fn fetch_benefit_page(&self) -> AppResult<ApiResponse> {
        let response = self
            .sdk_request(endpoints::BENEFIT_PAGE, &[], &[], HttpMethod::Get)
            .await?;

        let has_module = response
            .pointer("/Data/DailyBenefitModule")
            .is_some_and(|m| !m.is_null());
        if !has_module {
            return Err(AppError::unexpected_shape(
                endpoints::BENEFIT_PAGE,
                "Data.DailyBenefitModule",
            ));
        }

        Ok(response)
    }

    /// 游戏域名下的无签名 GET 请求
    pub async fn game_get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        cookies: &BTreeMap<String, String>,
    ) -> AppResult<HttpResponse> {
        let mut request = HttpRequest::get(url)
            .query(&owned_pairs(params))
            .header("User-Agent", self.session.user_agent.as_str())
            .header("Cookie", cookie_header(cookies));
        for (name, value) in GAME_HEADERS {
            request = request.header(name, value);
        }

        let response = self.transport.send(request).await?;
        debug!("游戏接口 {} 返回: {}", url, response.body);
        Ok(response)
    }

    /// 运行结束后打印会话信息
    pub fn log_session(&self) {
        info!(
            "用户[{}] 会话: 版本 {} / {}，cookies {} 项",
            self.session.username,
            self.session.version,
            self.session.version_code,
            self.session.cookies().len()
        );
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 解析响应并检测风控
fn parse_api_response(
    kind: SignKind,
    url: &str,
    response: &HttpResponse,
) -> AppResult<ApiResponse> {
    let body: JsonValue = serde_json::from_str(&response.body).map_err(|_| {
        error!("{}类型请求失败: {}", kind.as_str(), response.body);
        AppError::protocol(url, response.body.clone())
    })?;
    debug!("响应数据: {}", body);

    Ok(ApiResponse::new(body))
}
