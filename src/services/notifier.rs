//! 任务结果推送

use tracing::{debug, error, info};

use crate::models::task::{TaskKind, TaskOutcome};
use crate::services::push::PushChannel;

/// 生成推送标题与正文
pub fn build_summary(username: &str, results: &[(TaskKind, TaskOutcome)]) -> (String, String) {
    let mut body = format!("用户[{}]任务完成情况:\n", username);
    let mut success_count = 0;
    let mut has_captcha = false;
    let mut captcha_reason = None;

    for (kind, outcome) in results {
        let glyph = match outcome {
            TaskOutcome::Success => {
                success_count += 1;
                "✅"
            }
            TaskOutcome::Captcha { .. } => {
                has_captcha = true;
                "⚠️"
            }
            TaskOutcome::CaptchaFailed { reason, .. } => {
                has_captcha = true;
                captcha_reason = Some(reason.as_str());
                "❌"
            }
            TaskOutcome::Failed { .. } | TaskOutcome::Error { .. } => "❌",
        };
        body.push_str(&format!("{}: {}\n", kind.name(), glyph));
    }

    if has_captcha {
        body.push_str("\n⚠️ 任务因遇到验证码被中断，后续任务未执行\n");
        if let Some(reason) = captcha_reason {
            body.push_str(&format!("   错误原因: {}\n", reason));
        }
        body.push_str("   手动执行一次任务后可解除风控");
    }

    let title = format!("任务完成报告 - {}/{}", success_count, results.len());
    (title, body)
}

/// 推送分发器：逐个渠道发送，任何渠道的失败都不会影响其余渠道
pub struct Notifier {
    channels: Vec<Box<dyn PushChannel>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn PushChannel>>) -> Self {
        Self { channels }
    }

    /// 汇总结果并推送
    pub async fn notify(&self, username: &str, results: &[(TaskKind, TaskOutcome)]) {
        if self.channels.is_empty() {
            debug!("用户[{}]未配置推送服务", username);
            return;
        }

        let (title, body) = build_summary(username, results);
        self.dispatch(&title, &body).await;
    }

    /// 把同一条消息发到所有渠道，返回成功的渠道数
    pub async fn dispatch(&self, title: &str, body: &str) -> usize {
        let mut delivered = 0;
        for channel in &self.channels {
            let name = channel.name();
            match channel.send(title, body).await {
                Ok(receipt) if receipt.success => {
                    info!("[{}] 推送成功", name);
                    delivered += 1;
                }
                Ok(receipt) => {
                    info!("[{}] 推送失败", name);
                    debug!("[{}] 原始返回: {}", name, receipt.raw);
                }
                Err(e) => error!("[{}] 推送异常: {}", name, e),
            }
        }
        delivered
    }
}
