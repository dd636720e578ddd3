//! 每日抽奖任务

use tracing::{error, info, warn};

use crate::clients::endpoints;
use crate::error::{AppError, AppResult};
use crate::infrastructure::HttpMethod;
use crate::models::risk::{as_i64, ApiResponse};
use crate::models::task::TaskOutcome;
use crate::workflow::task_flow::{TaskFlow, CAPTCHA_PLACEHOLDERS};

/// 抽奖机会：(看视频得抽奖机会次数, 剩余抽奖次数)
fn lottery_chances(response: &ApiResponse) -> AppResult<(i64, i64)> {
    let read = |field: &str| {
        let path = format!("/Data/LotteryInfo/{}", field);
        response
            .pointer(&path)
            .and_then(as_i64)
            .ok_or_else(|| AppError::unexpected_shape(endpoints::CHECKIN_DETAIL, path))
    };
    Ok((read("HasVideoUrge")?, read("LotteryCount")?))
}

impl TaskFlow<'_> {
    pub async fn draw_lottery(&self) -> AppResult<TaskOutcome> {
        let detail = self
            .client
            .sdk_request(endpoints::CHECKIN_DETAIL, &[], &[], HttpMethod::Get)
            .await?;
        let (video_chance, lottery_chance) = lottery_chances(&detail)?;

        if video_chance == 0 && lottery_chance == 0 {
            info!("{} ✅ 抽奖机会已用完", self.ctx);
            return Ok(TaskOutcome::Success);
        }
        info!(
            "{} 观看视频机会: {}次, 抽奖机会: {}次",
            self.ctx, video_chance, lottery_chance
        );

        let mut video_body = CAPTCHA_PLACEHOLDERS.to_vec();
        video_body.extend([
            ("appId", "1002"),
            ("adId", "6050165817126400"),
            ("videoSucc", "1"),
        ]);
        for round in 1..=video_chance {
            let response = self
                .client
                .sdk_request(endpoints::VIDEO_CALLBACK, &[], &video_body, HttpMethod::Post)
                .await?;
            if let Some(outcome) = self.flagged(&response, "抽奖视频回调触发验证码") {
                return Ok(outcome);
            }
            if !response.is_ok() {
                error!("{} 观看抽奖视频失败: {}", self.ctx, response.body);
                return Ok(TaskOutcome::failed("观看抽奖视频失败"));
            }
            info!("{} 观看第{}次视频成功", self.ctx, round);
            self.pause().await;
        }

        for round in 1..=(video_chance + lottery_chance) {
            let response = self
                .client
                .sdk_request(endpoints::LOTTERY, &[], &CAPTCHA_PLACEHOLDERS, HttpMethod::Post)
                .await?;
            if let Some(outcome) = self.flagged(&response, "抽奖触发验证码") {
                return Ok(outcome);
            }
            if !response.is_ok() {
                error!("{} 抽奖失败: {}", self.ctx, response.body);
                return Ok(TaskOutcome::failed("抽奖失败"));
            }
            info!("{} 第{}次抽奖成功", self.ctx, round);
            self.pause().await;
        }

        let check = self
            .client
            .sdk_request(endpoints::CHECKIN_DETAIL, &[], &[], HttpMethod::Get)
            .await?;
        if lottery_chances(&check)? == (0, 0) {
            info!("{} ✅ 抽奖任务完成", self.ctx);
            Ok(TaskOutcome::Success)
        } else {
            error!("{} 抽奖任务未完成", self.ctx);
            Ok(TaskOutcome::failed("抽奖任务未完成"))
        }
    }

    /// 抽奖相关子请求被风控时直接中断，不尝试验证码
    fn flagged(&self, response: &ApiResponse, reason: &str) -> Option<TaskOutcome> {
        let risk = response.risk.clone()?;
        warn!("{} ⚠️ {}", self.ctx, reason);
        Some(TaskOutcome::Captcha {
            reason: reason.to_string(),
            risk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lottery_chances() {
        let response = ApiResponse::new(json!({
            "Result": 0,
            "Data": {"LotteryInfo": {"HasVideoUrge": "1", "LotteryCount": 2}}
        }));
        assert_eq!(lottery_chances(&response).unwrap(), (1, 2));

        let missing = ApiResponse::new(json!({"Result": 0, "Data": {}}));
        assert!(matches!(
            lottery_chances(&missing),
            Err(AppError::UnexpectedShape { .. })
        ));
    }
}
