//! 风控描述与响应分类
//!
//! 起点接口的风控标记藏在普通响应的 `Data.RiskConf` 中，`BanId` 非 0 即需要验证码

use serde_json::Value as JsonValue;

/// 风控 / 验证码描述
#[derive(Debug, Clone, PartialEq)]
pub struct RiskDescriptor {
    /// 0 = 无风控，2 = 可处理的验证码，其余为不支持的风控状态
    pub ban_id: i64,
    /// 验证码类型（CaptchaAId）
    pub captcha_a_id: String,
    pub session_key: String,
    pub ban_message: String,
    /// 原始 RiskConf
    pub raw: JsonValue,
}

impl RiskDescriptor {
    /// 从 RiskConf 对象解析
    pub fn from_risk_conf(conf: &JsonValue) -> Self {
        Self {
            ban_id: coerce_i64(conf.get("BanId")),
            captcha_a_id: coerce_string(conf.get("CaptchaAId")),
            session_key: coerce_string(conf.get("SessionKey")),
            ban_message: coerce_string(conf.get("BanMessage")),
            raw: conf.clone(),
        }
    }

    /// 从整个响应体中查找风控描述（仅 `BanId` 非 0 时返回）
    pub fn detect(body: &JsonValue) -> Option<Self> {
        let conf = body.pointer("/Data/RiskConf")?;
        let risk = Self::from_risk_conf(conf);
        (risk.ban_id != 0).then_some(risk)
    }
}

/// 已分类的接口响应
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: JsonValue,
    pub risk: Option<RiskDescriptor>,
}

impl ApiResponse {
    pub fn new(body: JsonValue) -> Self {
        let risk = RiskDescriptor::detect(&body);
        Self { body, risk }
    }

    /// 是否触发验证码
    pub fn is_captcha(&self) -> bool {
        self.risk.is_some()
    }

    /// 顶层 `Result` 字段（字符串或数字）
    pub fn result_code(&self) -> Option<i64> {
        self.body.get("Result").and_then(as_i64)
    }

    pub fn is_ok(&self) -> bool {
        self.result_code() == Some(0)
    }

    pub fn pointer(&self, path: &str) -> Option<&JsonValue> {
        self.body.pointer(path)
    }
}

/// 把字符串或数字形式的整数统一为 i64
pub fn as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// 非数字或缺失时视为 0
pub fn coerce_i64(value: Option<&JsonValue>) -> i64 {
    value.and_then(as_i64).unwrap_or(0)
}

pub fn coerce_string(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
