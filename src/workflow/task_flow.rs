//! 任务流程 - 流程层
//!
//! 核心职责：定义"一个任务"的完整处理流程
//!
//! 所有任务都遵循同一模式：
//! 1. 拉取任务状态
//! 2. 判断是否需要执行
//! 3. 执行零或多次子请求（子请求之间短暂停顿）
//! 4. 重新拉取并确认完成情况
//!
//! 各任务的具体实现分别位于 `checkin` / `fragments` / `bonus_unlock` / `game` / `lottery`

use serde_json::Value as JsonValue;
use tracing::{error, info};

use crate::clients::{endpoints, QidianClient};
use crate::error::{AppError, AppResult};
use crate::models::risk::{coerce_i64, coerce_string, ApiResponse};
use crate::models::task::{TaskKind, TaskOutcome};
use crate::services::CaptchaResolver;
use crate::workflow::task_ctx::TaskCtx;

/// 福利中心中的一条任务
#[derive(Debug, Clone, PartialEq)]
pub struct BenefitTask {
    pub task_id: String,
    pub title: String,
    pub is_finished: bool,
    pub is_received: bool,
    pub action_url: String,
    /// 目标进度（游戏任务为分钟数）
    pub total: i64,
    pub process: i64,
}

impl BenefitTask {
    pub fn from_json(value: &JsonValue) -> Self {
        Self {
            task_id: coerce_string(value.get("TaskId")),
            title: coerce_string(value.get("Title")),
            is_finished: coerce_i64(value.get("IsFinished")) == 1,
            is_received: coerce_i64(value.get("IsReceived")) == 1,
            action_url: coerce_string(value.get("ActionUrl")),
            total: coerce_i64(value.get("Total")),
            process: coerce_i64(value.get("Process")),
        }
    }

    /// 剩余进度
    pub fn remaining(&self) -> i64 {
        self.total.saturating_sub(self.process)
    }
}

/// 从福利中心响应中读取指定路径下的任务列表
pub fn benefit_tasks(response: &ApiResponse, path: &str) -> AppResult<Vec<BenefitTask>> {
    let list = response
        .pointer(path)
        .and_then(JsonValue::as_array)
        .ok_or_else(|| AppError::unexpected_shape(endpoints::BENEFIT_PAGE, path))?;
    Ok(list.iter().map(BenefitTask::from_json).collect())
}

/// 任务流程
///
/// - 不持有任何资源，只借用账号的客户端与验证码服务
/// - 每个账号创建一次，按顺序执行各任务
pub struct TaskFlow<'a> {
    pub(crate) client: &'a QidianClient,
    pub(crate) resolver: &'a CaptchaResolver,
    pub(crate) ctx: TaskCtx,
}

impl<'a> TaskFlow<'a> {
    pub fn new(client: &'a QidianClient, resolver: &'a CaptchaResolver, ctx: TaskCtx) -> Self {
        Self {
            client,
            resolver,
            ctx,
        }
    }

    pub fn ctx(&self) -> &TaskCtx {
        &self.ctx
    }

    /// 执行一次指定任务
    pub async fn run(&self, kind: TaskKind) -> AppResult<TaskOutcome> {
        match kind {
            TaskKind::CheckIn => self.check_in().await,
            TaskKind::Fragments => self.collect_fragments().await,
            TaskKind::BonusUnlock => self.unlock_bonus().await,
            TaskKind::Game => self.play_game().await,
            TaskKind::Lottery => self.draw_lottery().await,
        }
    }

    /// 完成一个激励任务（领取奖励），始终经过验证码处理
    pub async fn finish_watch(&self, task_id: &str) -> AppResult<TaskOutcome> {
        let body = [
            ("taskId", task_id),
            ("BanId", "0"),
            ("BanMessage", ""),
            ("CaptchaAId", ""),
            ("CaptchaType", "0"),
            ("CaptchaURL", ""),
            ("Challenge", ""),
            ("Gt", ""),
            ("NewCaptcha", "0"),
            ("Offline", "0"),
            ("PhoneNumber", ""),
            ("SessionKey", ""),
        ];

        let resolution = self
            .resolver
            .resolve(self.client, endpoints::FINISH_WATCH, &body)
            .await?;

        let response = match resolution.into_outcome() {
            Ok(response) => response,
            Err(outcome) => return Ok(outcome),
        };

        if response.is_ok() {
            info!("{} ✓ 激励任务 {} 完成", self.ctx, task_id);
            Ok(TaskOutcome::Success)
        } else {
            error!("{} 激励任务执行失败: {}", self.ctx, response.body);
            Ok(TaskOutcome::failed(format!(
                "激励任务执行失败: Result={}",
                response.result_code().unwrap_or(-1)
            )))
        }
    }

    /// 子请求之间的停顿
    pub(crate) async fn pause(&self) {
        self.client.pacer().short_pause().await;
    }
}

/// 签到与抽奖共用的空验证码字段
pub(crate) const CAPTCHA_PLACEHOLDERS: [(&str, &str); 7] = [
    ("sessionKey", ""),
    ("banId", "0"),
    ("captchaTicket", ""),
    ("captchaRandStr", ""),
    ("challenge", ""),
    ("validate", ""),
    ("seccode", ""),
];
