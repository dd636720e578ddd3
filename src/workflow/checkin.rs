//! 签到任务

use tracing::{error, info, warn};

use crate::clients::endpoints;
use crate::error::AppResult;
use crate::infrastructure::HttpMethod;
use crate::models::risk::ApiResponse;
use crate::models::task::TaskOutcome;
use crate::workflow::task_flow::{TaskFlow, CAPTCHA_PLACEHOLDERS};

/// 今日已签到
const ALREADY_CHECKED_IN: i64 = -91002;

impl TaskFlow<'_> {
    pub async fn check_in(&self) -> AppResult<TaskOutcome> {
        let response = self
            .client
            .qd_request(endpoints::CHECKIN, &[], &CAPTCHA_PLACEHOLDERS, HttpMethod::Post)
            .await?;

        let outcome = classify_check_in(response);
        match &outcome {
            TaskOutcome::Success => info!("{} ✅ 签到成功", self.ctx),
            TaskOutcome::Captcha { .. } => warn!("{} ⚠️ 签到触发验证码", self.ctx),
            other => error!("{} ❌ {}", self.ctx, other.reason().unwrap_or("签到失败")),
        }
        Ok(outcome)
    }
}

/// 签到结果判定，成功判定优先于风控判定
pub fn classify_check_in(response: ApiResponse) -> TaskOutcome {
    let result = response.result_code();
    if result == Some(ALREADY_CHECKED_IN) {
        return TaskOutcome::Success;
    }

    let has_check_in = response
        .pointer("/Data/HasCheckIn")
        .and_then(crate::models::risk::as_i64);
    if result == Some(0) && has_check_in == Some(1) {
        return TaskOutcome::Success;
    }

    if let Some(risk) = response.risk {
        return TaskOutcome::Captcha {
            reason: "签到触发验证码".to_string(),
            risk,
        };
    }

    TaskOutcome::failed(format!("签到失败: {}", response.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_already_checked_in_is_success() {
        let response = ApiResponse::new(json!({"Result": -91002, "Message": "今日已签到"}));
        assert_eq!(classify_check_in(response), TaskOutcome::Success);
    }

    #[test]
    fn test_has_check_in_flag() {
        let ok = ApiResponse::new(json!({"Result": 0, "Data": {"HasCheckIn": 1}}));
        assert_eq!(classify_check_in(ok), TaskOutcome::Success);

        let not_yet = ApiResponse::new(json!({"Result": 0, "Data": {"HasCheckIn": 0}}));
        assert_eq!(classify_check_in(not_yet).status(), "failed");
    }

    #[test]
    fn test_flagged_check_in_is_captcha() {
        let response = ApiResponse::new(json!({
            "Result": 1,
            "Data": {"RiskConf": {"BanId": 2, "CaptchaAId": "198420051", "SessionKey": "k"}}
        }));
        let outcome = classify_check_in(response);
        assert_eq!(outcome.status(), "captcha");
        assert_eq!(outcome.risk().map(|r| r.ban_id), Some(2));
    }
}
