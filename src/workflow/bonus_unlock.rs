//! 章节卡任务（完成3个广告任务得奖励）

use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::task::TaskOutcome;
use crate::workflow::task_flow::{benefit_tasks, BenefitTask, TaskFlow};

const BONUS_LIST: &str = "/Data/VideoRewardTab/TaskList";
const BONUS_TITLE: &str = "完成3个广告任务得奖励";
const BONUS_ROUNDS: usize = 3;

fn find_bonus(tasks: Vec<BenefitTask>) -> Option<BenefitTask> {
    tasks.into_iter().find(|task| task.title == BONUS_TITLE)
}

impl TaskFlow<'_> {
    pub async fn unlock_bonus(&self) -> AppResult<TaskOutcome> {
        let page = self.client.fetch_benefit_page().await?;
        let Some(bonus) = find_bonus(benefit_tasks(&page, BONUS_LIST)?) else {
            error!("{} 未找到章节卡任务", self.ctx);
            return Ok(TaskOutcome::failed("未找到章节卡任务"));
        };

        if bonus.is_received {
            info!("{} ✅ 章节卡任务已完成", self.ctx);
            return Ok(TaskOutcome::Success);
        }

        for round in 1..=BONUS_ROUNDS {
            match self.finish_watch(&bonus.task_id).await? {
                TaskOutcome::Success => self.pause().await,
                outcome if outcome.is_captcha_family() => {
                    warn!(
                        "{} ⚠️ 章节卡任务被验证码中断: {}",
                        self.ctx,
                        outcome.reason().unwrap_or_default()
                    );
                    return Ok(outcome);
                }
                _ => warn!("{} 第{}次执行章节卡任务失败", self.ctx, round),
            }
        }

        let check = self.client.fetch_benefit_page().await?;
        match find_bonus(benefit_tasks(&check, BONUS_LIST)?) {
            Some(task) if task.is_received => {
                info!("{} ✅ 章节卡任务完成", self.ctx);
                Ok(TaskOutcome::Success)
            }
            Some(_) => {
                error!("{} 章节卡任务未完成", self.ctx);
                Ok(TaskOutcome::failed("章节卡任务未完成"))
            }
            None => {
                error!("{} 未找到章节卡任务", self.ctx);
                Ok(TaskOutcome::failed("未找到章节卡任务"))
            }
        }
    }
}
