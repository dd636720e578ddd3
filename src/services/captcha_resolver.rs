//! 验证码处理服务 - 业务能力层
//!
//! 状态流转：
//!
//! ```text
//! Idle ──请求被风控──▶ Requested ──▶ Solved ──重放请求──▶ (未风控) Passed
//!                          │                    └──(仍风控)──▶ Requested
//!                          ├──▶ Unsupported   BanId≠2 / 类型不在白名单 / 服务返回 false
//!                          └──▶ SolveFailed   无 tokenid / 识别失败 / 超过尝试次数
//! ```
//!
//! 这里的尝试次数只统计验证码求解，与编排层的任务重试次数相互独立

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::clients::{CaptchaOracle, OracleReply, QidianClient};
use crate::error::AppResult;
use crate::infrastructure::HttpMethod;
use crate::models::risk::{ApiResponse, RiskDescriptor};
use crate::models::task::TaskOutcome;
use crate::utils::logging::truncate_text;

/// 唯一可处理的 BanId
pub const SUPPORTED_BAN_ID: i64 = 2;

/// 支持的验证码类型（CaptchaAId）
pub const SUPPORTED_CAPTCHA_TYPES: [&str; 1] = ["198420051"];

/// 默认最大求解次数
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// 一次带验证码处理的请求的最终结果
#[derive(Debug, Clone)]
pub enum CaptchaResolution {
    /// 请求最终未被风控（可能经过了若干次验证码）
    Passed(ApiResponse),
    /// 验证码类型不支持，不再重试
    Unsupported { reason: String, risk: RiskDescriptor },
    /// 支持的验证码，但没有解决
    SolveFailed { reason: String, risk: RiskDescriptor },
}

impl CaptchaResolution {
    /// 验证码类结果转为任务结果；`Passed` 交给调用方判断
    pub fn into_outcome(self) -> Result<ApiResponse, TaskOutcome> {
        match self {
            CaptchaResolution::Passed(response) => Ok(response),
            CaptchaResolution::Unsupported { reason, risk } => {
                Err(TaskOutcome::Captcha { reason, risk })
            }
            CaptchaResolution::SolveFailed { reason, risk } => {
                Err(TaskOutcome::CaptchaFailed { reason, risk })
            }
        }
    }
}

/// 单次求解的结论
#[derive(Debug, Clone, PartialEq)]
pub enum SolveVerdict {
    Solved { ticket: String, randstr: String },
    Unsupported(String),
    Failed(String),
}

/// 验证码处理服务
pub struct CaptchaResolver {
    oracle: Arc<dyn CaptchaOracle>,
    max_attempts: usize,
}

impl CaptchaResolver {
    pub fn new(oracle: Arc<dyn CaptchaOracle>, max_attempts: usize) -> Self {
        Self {
            oracle,
            max_attempts,
        }
    }

    /// 发送 sdk POST 请求，遇到验证码时自动求解并重放
    pub async fn resolve(
        &self,
        client: &QidianClient,
        url: &str,
        body: &[(&str, &str)],
    ) -> AppResult<CaptchaResolution> {
        let task_id = body
            .iter()
            .find(|(k, _)| *k == "taskId")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();

        let mut response = client.sdk_request(url, &[], body, HttpMethod::Post).await?;
        let mut attempts = 0;

        loop {
            let Some(risk) = response.risk.clone() else {
                return Ok(CaptchaResolution::Passed(response));
            };
            debug!("风控数据: {}", risk.raw);

            let Some(tokenid) = client.session().tokenid.as_deref() else {
                info!("未设置tokenid，跳过验证码处理");
                return Ok(CaptchaResolution::SolveFailed {
                    reason: "跳过验证码处理：未设置tokenid".to_string(),
                    risk,
                });
            };

            if let Some(reason) = unsupported_reason(&risk) {
                error!("{}", reason);
                return Ok(CaptchaResolution::Unsupported { reason, risk });
            }

            if attempts >= self.max_attempts {
                let reason = format!("验证码尝试次数超过{}次", self.max_attempts);
                error!("{}", reason);
                return Ok(CaptchaResolution::SolveFailed { reason, risk });
            }
            attempts += 1;
            info!("第{}次尝试解决验证码...", attempts);

            let (ticket, randstr) = match self
                .solve(tokenid, &risk, &client.session().user_agent)
                .await
            {
                SolveVerdict::Solved { ticket, randstr } => (ticket, randstr),
                SolveVerdict::Unsupported(reason) => {
                    return Ok(CaptchaResolution::Unsupported { reason, risk });
                }
                SolveVerdict::Failed(reason) => {
                    return Ok(CaptchaResolution::SolveFailed { reason, risk });
                }
            };

            let replay = replay_body(&task_id, &risk, &ticket, &randstr);
            let replay: Vec<(&str, &str)> =
                replay.iter().map(|(k, v)| (*k, v.as_str())).collect();
            response = client
                .sdk_request(url, &[], &replay, HttpMethod::Post)
                .await?;
        }
    }

    /// 调用验证码服务并解释其三态回复
    pub async fn solve(
        &self,
        tokenid: &str,
        risk: &RiskDescriptor,
        user_agent: &str,
    ) -> SolveVerdict {
        info!("开始进行验证码处理");
        let reply = match self
            .oracle
            .solve(tokenid, &risk.captcha_a_id, user_agent)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("验证码处理异常: {}", e);
                return SolveVerdict::Failed(format!("验证码服务不可用: {}", e));
            }
        };
        debug!("验证码识别结果: {:?}", reply);

        interpret_reply(reply)
    }
}

/// 不需要调用验证码服务就能判定为不支持的情况
pub fn unsupported_reason(risk: &RiskDescriptor) -> Option<String> {
    if risk.ban_id != SUPPORTED_BAN_ID {
        return Some(format!(
            "非预料的BanId: {}，可能是设备风控或其他原因",
            risk.ban_id
        ));
    }
    if !SUPPORTED_CAPTCHA_TYPES.contains(&risk.captcha_a_id.as_str()) {
        return Some(format!(
            "未实现的验证码类型: {}，当前仅支持{}",
            risk.captcha_a_id,
            SUPPORTED_CAPTCHA_TYPES.join(", ")
        ));
    }
    None
}

/// 解释验证码服务的回复
pub fn interpret_reply(reply: OracleReply) -> SolveVerdict {
    match reply {
        OracleReply::Unsupported => {
            warn!("验证码服务不支持该验证码");
            SolveVerdict::Unsupported("验证码服务不支持该验证码类型".to_string())
        }
        OracleReply::Absent => {
            error!("验证码识别返回格式错误");
            SolveVerdict::Failed("验证码识别返回格式错误".to_string())
        }
        OracleReply::Reply(reply) => {
            let message = reply.message.clone().unwrap_or_default();
            match reply.code {
                0 => match (reply.ticket, reply.randstr) {
                    (Some(ticket), Some(randstr)) if !ticket.is_empty() => {
                        info!(
                            "验证码识别成功: randstr={}, ticket={}",
                            randstr,
                            truncate_text(&ticket, 10)
                        );
                        SolveVerdict::Solved { ticket, randstr }
                    }
                    _ => {
                        error!("验证码识别成功但缺少 ticket/randstr");
                        SolveVerdict::Failed("验证码识别结果不完整".to_string())
                    }
                },
                code @ (12 | 50 | 666) => {
                    error!("验证码识别失败 (code={}): {}", code, message);
                    SolveVerdict::Failed(format!(
                        "验证码识别失败 (code={}): {}",
                        code, message
                    ))
                }
                code => {
                    error!("未知返回 (code={}): {}", code, message);
                    SolveVerdict::Failed(format!("验证码服务未知返回 (code={})", code))
                }
            }
        }
    }
}

/// 验证码通过后的重放请求体
pub fn replay_body(
    task_id: &str,
    risk: &RiskDescriptor,
    ticket: &str,
    randstr: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("taskId", task_id.to_string()),
        ("sessionKey", risk.session_key.clone()),
        ("banId", risk.ban_id.to_string()),
        ("captchaTicket", ticket.to_string()),
        ("captchaRandStr", randstr.to_string()),
        ("challenge", String::new()),
        ("validate", String::new()),
        ("seccode", String::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CaptchaReply;
    use serde_json::json;

    fn risk(ban_id: i64, captcha: &str) -> RiskDescriptor {
        RiskDescriptor::from_risk_conf(&json!({
            "BanId": ban_id,
            "CaptchaAId": captcha,
            "SessionKey": "session-key",
        }))
    }

    #[test]
    fn test_unsupported_classification() {
        assert!(unsupported_reason(&risk(2, "198420051")).is_none());
        assert!(unsupported_reason(&risk(1, "198420051"))
            .unwrap()
            .contains("BanId"));
        assert!(unsupported_reason(&risk(2, "999")).unwrap().contains("999"));
    }

    #[test]
    fn test_false_and_absent_are_distinct() {
        assert!(matches!(
            interpret_reply(OracleReply::Unsupported),
            SolveVerdict::Unsupported(_)
        ));
        assert!(matches!(
            interpret_reply(OracleReply::Absent),
            SolveVerdict::Failed(_)
        ));
    }

    #[test]
    fn test_documented_failure_codes_keep_code() {
        for code in [12, 50, 666, 7] {
            let verdict = interpret_reply(OracleReply::Reply(CaptchaReply {
                code,
                randstr: None,
                ticket: None,
                message: Some("失败".to_string()),
            }));
            match verdict {
                SolveVerdict::Failed(reason) => assert!(reason.contains(&code.to_string())),
                other => panic!("unexpected verdict {:?}", other),
            }
        }
    }

    #[test]
    fn test_replay_body_fields() {
        let body = replay_body("task-9", &risk(2, "198420051"), "tick", "rand");
        let keys: Vec<_> = body.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "taskId",
                "sessionKey",
                "banId",
                "captchaTicket",
                "captchaRandStr",
                "challenge",
                "validate",
                "seccode"
            ]
        );
        assert_eq!(body[1].1, "session-key");
        assert_eq!(body[2].1, "2");
        assert!(body[5..].iter().all(|(_, v)| v.is_empty()));
    }
}
