//! 单个账号处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **登录检测**：未登录的账号不执行任何任务
//! 2. **任务调度**：按固定顺序执行已启用的任务
//! 3. **重试策略**：失败 / 异常在次数内重试，成功或验证码类结果立即停止
//! 4. **结果汇总**：生成 `(任务, 结果)` 列表供推送使用

use tracing::{debug, error, info, warn};

use crate::clients::QidianClient;
use crate::models::task::{TaskKind, TaskOutcome};
use crate::services::CaptchaResolver;
use crate::workflow::{TaskCtx, TaskFlow};

/// 单个账号的运行结果
#[derive(Debug, Clone)]
pub struct AccountReport {
    pub username: String,
    pub nickname: String,
    pub results: Vec<(TaskKind, TaskOutcome)>,
}

impl AccountReport {
    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }

    pub fn outcome(&self, kind: TaskKind) -> Option<&TaskOutcome> {
        self.results
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }
}

/// 处理单个账号
///
/// # 返回
/// 登录检测失败时返回 `None`（账号被跳过）
pub async fn process_account(
    client: &QidianClient,
    resolver: &CaptchaResolver,
    account_index: usize,
    retry_attempts: usize,
) -> Option<AccountReport> {
    let session = client.session();
    let ctx = TaskCtx::new(account_index, session.username.as_str());
    if let Some(usertype) = session.usertype.as_deref() {
        debug!("{} usertype: {}", ctx, usertype);
    }

    info!("{} 开始检查用户[{}]登录状态", ctx, session.username);
    let Some(nickname) = client.check_login().await else {
        warn!("{} 用户[{}]未登录，跳过", ctx, session.username);
        return None;
    };
    info!("{} ✓ 用户[{}]登录成功", ctx, nickname);

    let flow = TaskFlow::new(client, resolver, ctx);
    let mut results = Vec::new();

    for kind in TaskKind::ORDER {
        if !session.is_enabled(kind) {
            info!("{} 任务[{}]已禁用，跳过执行", flow.ctx(), kind);
            continue;
        }
        let outcome = run_task(&flow, kind, retry_attempts).await;
        results.push((kind, outcome));
    }

    Some(AccountReport {
        username: session.username.clone(),
        nickname,
        results,
    })
}

/// 执行单个任务（含重试）
///
/// 成功或验证码类结果立即返回；失败、异常在 `retry_attempts` 次内重试，最后一次的结果为准
pub async fn run_task(flow: &TaskFlow<'_>, kind: TaskKind, retry_attempts: usize) -> TaskOutcome {
    let ctx = flow.ctx();
    let attempts = retry_attempts.max(1);
    info!("{} 🚀 开始执行任务: {}", ctx, kind);

    let mut last = TaskOutcome::error("任务未执行");
    for attempt in 1..=attempts {
        info!("{} 开始第{}次尝试", ctx, attempt);

        let outcome = match flow.run(kind).await {
            Ok(outcome) => outcome,
            Err(e) => TaskOutcome::error(e.to_string()),
        };

        match &outcome {
            TaskOutcome::Success => {
                info!("{} ✅ 任务[{}]执行完成: 成功", ctx, kind);
                return outcome;
            }
            TaskOutcome::Captcha { reason, .. } => {
                warn!("{} ⚠️ 任务[{}]因验证码中断: {}", ctx, kind, reason);
                return outcome;
            }
            TaskOutcome::CaptchaFailed { reason, risk } => {
                error!("{} ❌ 任务[{}]因验证码失败: {}", ctx, kind, reason);
                debug!("验证码数据: {}", risk.raw);
                return outcome;
            }
            TaskOutcome::Failed { reason } | TaskOutcome::Error { reason } => {
                if attempt < attempts {
                    warn!(
                        "{} 任务[{}]第{}次执行失败: {}，正在重试...",
                        ctx, kind, attempt, reason
                    );
                    flow.client.pacer().short_pause().await;
                } else {
                    error!(
                        "{} ❌ 任务[{}]执行失败，已达到最大重试次数: {}",
                        ctx, kind, reason
                    );
                }
            }
        }
        last = outcome;
    }

    last
}
