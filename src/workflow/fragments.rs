//! 激励碎片任务

use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::task::TaskOutcome;
use crate::workflow::task_flow::{benefit_tasks, TaskFlow};

const FRAGMENT_LIST: &str = "/Data/DailyBenefitModule/TaskList";

impl TaskFlow<'_> {
    pub async fn collect_fragments(&self) -> AppResult<TaskOutcome> {
        let page = self.client.fetch_benefit_page().await?;
        let tasks = benefit_tasks(&page, FRAGMENT_LIST)?;

        let Some(last) = tasks.last() else {
            error!("{} 激励碎片任务列表为空", self.ctx);
            return Ok(TaskOutcome::failed("激励碎片任务列表为空"));
        };
        if last.is_finished {
            info!("{} ✅ 激励碎片任务已经完成", self.ctx);
            return Ok(TaskOutcome::Success);
        }

        for (index, task) in tasks.iter().enumerate() {
            if task.is_finished {
                continue;
            }
            info!("{} 正在执行第{}个任务", self.ctx, index + 1);

            match self.finish_watch(&task.task_id).await? {
                TaskOutcome::Success => self.pause().await,
                outcome if outcome.is_captcha_family() => {
                    warn!(
                        "{} ⚠️ 激励碎片任务被验证码中断: {}",
                        self.ctx,
                        outcome.reason().unwrap_or_default()
                    );
                    return Ok(outcome);
                }
                outcome => {
                    error!("{} 执行激励任务失败", self.ctx);
                    return Ok(TaskOutcome::failed(
                        outcome.reason().unwrap_or("执行激励任务失败"),
                    ));
                }
            }
        }

        let check = self.client.fetch_benefit_page().await?;
        let all_finished = benefit_tasks(&check, FRAGMENT_LIST)?
            .iter()
            .all(|task| task.is_finished);

        if all_finished {
            info!("{} ✅ 激励碎片任务完成", self.ctx);
            Ok(TaskOutcome::Success)
        } else {
            error!("{} 激励碎片任务未完成", self.ctx);
            Ok(TaskOutcome::failed("激励碎片任务未完成"))
        }
    }
}
