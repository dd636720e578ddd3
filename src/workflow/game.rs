//! 游戏中心任务
//!
//! 两种任务形态：
//! - "当日玩游戏10分钟"：固定游戏 201796，从 ActionUrl 取 partnerid
//! - "首次玩…10分钟"：游戏 ID 与 partnerid 都从 ActionUrl 中解析
//!
//! 未完成时先调用曝光统计接口拿到 PHESSID，再按服务端给出的间隔发送心跳，
//! 累计时长达到 (剩余分钟 + 1) × 60 秒后领取奖励

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::clients::endpoints;
use crate::error::AppResult;
use crate::models::risk::{as_i64, coerce_i64};
use crate::models::task::TaskOutcome;
use crate::workflow::task_flow::{benefit_tasks, BenefitTask, TaskFlow};

const GAME_LIST: &str = "/Data/MoreRewardTab/TaskList";
const DAILY_GAME_TITLE: &str = "当日玩游戏10分钟";
const DAILY_GAME_ID: &str = "201796";

fn first_play_title() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^首次玩.*10分钟$").expect("游戏标题正则无效"))
}

fn partner_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"partnerid=(\d+)").expect("partnerid 正则无效"))
}

fn game_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/game/(\d+).*?partnerid=(\d+)").expect("游戏URL正则无效"))
}

/// 游戏任务形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameShape {
    Daily,
    FirstPlay,
}

impl GameShape {
    pub fn of(title: &str) -> Option<Self> {
        if title == DAILY_GAME_TITLE {
            Some(GameShape::Daily)
        } else if first_play_title().is_match(title) {
            Some(GameShape::FirstPlay)
        } else {
            None
        }
    }

    /// 从 ActionUrl 中解析 (游戏 ID, partnerid)
    pub fn game_target(self, action_url: &str) -> Option<(String, String)> {
        match self {
            GameShape::Daily => {
                let caps = partner_id_pattern().captures(action_url)?;
                Some((DAILY_GAME_ID.to_string(), caps[1].to_string()))
            }
            GameShape::FirstPlay => {
                let caps = game_url_pattern().captures(action_url)?;
                Some((caps[1].to_string(), caps[2].to_string()))
            }
        }
    }
}

/// 列表中第一条游戏任务
fn find_game(tasks: Vec<BenefitTask>) -> Option<(GameShape, BenefitTask)> {
    tasks
        .into_iter()
        .find_map(|task| GameShape::of(&task.title).map(|shape| (shape, task)))
}

/// 生成 trackid：四组 8 位小写十六进制，以 '-' 连接
pub fn generate_trackid() -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| {
            (0..8)
                .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// 心跳需要累计的秒数
pub fn required_seconds(remaining_minutes: i64) -> u64 {
    remaining_minutes
        .max(0)
        .saturating_add(1)
        .saturating_mul(60) as u64
}

impl TaskFlow<'_> {
    pub async fn play_game(&self) -> AppResult<TaskOutcome> {
        let page = self.client.fetch_benefit_page().await?;
        let Some((shape, task)) = find_game(benefit_tasks(&page, GAME_LIST)?) else {
            error!("{} 游戏中心任务未找到", self.ctx);
            return Ok(TaskOutcome::failed("游戏中心任务未找到"));
        };
        let remaining = task.remaining();

        if task.is_received {
            info!("{} ✅ 游戏中心任务已完成", self.ctx);
            return Ok(TaskOutcome::Success);
        }
        if task.is_finished || remaining <= 0 {
            info!("{} 游戏中心任务已完成，奖励未领取，开始领取", self.ctx);
            return self.claim_game_reward(&task.task_id).await;
        }
        info!(
            "{} 游戏中心任务未完成（剩余 {} 分钟），开始执行",
            self.ctx, remaining
        );

        let Some((game_id, partner_id)) = shape.game_target(&task.action_url) else {
            error!("{} 游戏中心任务URL错误: {}", self.ctx, task.action_url);
            return Ok(TaskOutcome::failed("游戏中心任务URL错误"));
        };
        let game_url = format!("{}/{}?partnerid={}", endpoints::GAME_PAGE, game_id, partner_id);
        info!("{} 游戏中心任务URL: {}", self.ctx, game_url);

        let Some(phessid) = self.fetch_game_session(&game_url).await? else {
            return Ok(TaskOutcome::failed("获取进程ID失败"));
        };

        let mut cookies = self.client.session().cookies();
        cookies.insert("PHESSID".to_string(), phessid);
        cookies.insert("trackid".to_string(), generate_trackid());

        if let Err(reason) = self
            .heartbeat(&game_id, required_seconds(remaining), &cookies)
            .await?
        {
            return Ok(TaskOutcome::failed(reason));
        }

        info!("{} 游戏时长已满足，开始领取奖励", self.ctx);
        self.claim_game_reward(&task.task_id).await
    }

    /// 领取奖励并重新确认领取状态
    async fn claim_game_reward(&self, task_id: &str) -> AppResult<TaskOutcome> {
        match self.finish_watch(task_id).await? {
            TaskOutcome::Success => {}
            outcome if outcome.is_captcha_family() => {
                warn!("{} ⚠️ 领取游戏奖励遇到验证码", self.ctx);
                return Ok(outcome);
            }
            _ => {
                error!("{} 游戏中心任务领取失败", self.ctx);
                return Ok(TaskOutcome::failed("游戏中心任务领取失败"));
            }
        }

        info!("{} 检查完成情况", self.ctx);
        let check = self.client.fetch_benefit_page().await?;
        match find_game(benefit_tasks(&check, GAME_LIST)?) {
            Some((_, task)) if task.is_received => {
                info!("{} ✅ 游戏中心任务已完成", self.ctx);
                Ok(TaskOutcome::Success)
            }
            _ => {
                error!("{} 游戏中心任务未完成", self.ctx);
                Ok(TaskOutcome::failed("游戏中心任务未完成"))
            }
        }
    }

    /// 曝光统计接口，成功时返回 PHESSID
    async fn fetch_game_session(&self, game_url: &str) -> AppResult<Option<String>> {
        let params = [
            ("action", "gameball_impression"),
            ("positionType", "0"),
            ("gameId", "0"),
            ("url", game_url),
            ("origin", "https://qdgame.qidian.com"),
            ("platformId", "1"),
        ];
        let response = self
            .client
            .game_get(endpoints::GAME_TRACK, &params, &self.client.session().cookies())
            .await?;

        if response.status != 200 {
            error!("{} 获取进程ID失败: HTTP {}", self.ctx, response.status);
            return Ok(None);
        }
        let tracked = response.json().is_some_and(|body| {
            body.get("code").and_then(as_i64) == Some(0) && is_truthy(body.get("msg"))
        });
        if !tracked {
            error!("{} 获取进程ID失败: {}", self.ctx, response.body);
            return Ok(None);
        }

        let phessid = response.set_cookies.get("PHESSID").cloned();
        debug!("PHESSID: {:?}", phessid);
        if phessid.is_none() {
            error!("{} 获取进程ID失败: 响应中没有 PHESSID", self.ctx);
        }
        Ok(phessid)
    }

    /// 心跳循环；心跳异常时返回 `Err(原因)`
    async fn heartbeat(
        &self,
        game_id: &str,
        required: u64,
        cookies: &BTreeMap<String, String>,
    ) -> AppResult<Result<(), String>> {
        let params = [("gameId", game_id), ("platformId", "1")];
        let mut elapsed = 0u64;

        while elapsed < required {
            let response = self
                .client
                .game_get(endpoints::GAME_HEARTBEAT, &params, cookies)
                .await?;

            let interval = response.json().and_then(|body| {
                (body.get("code").and_then(as_i64) == Some(0))
                    .then(|| coerce_i64(body.get("data")))
                    .filter(|data| *data > 0)
            });
            let Some(interval) = interval else {
                error!("{} 心跳失败: {}", self.ctx, response.body);
                return Ok(Err("心跳失败".to_string()));
            };

            let interval = interval as u64;
            elapsed += interval;
            info!(
                "{} 💓 心跳成功，下一次心跳间隔: {}s（{}/{}s）",
                self.ctx, interval, elapsed, required
            );
            self.client
                .pacer()
                .sleep(Duration::from_secs(interval))
                .await;
        }
        Ok(Ok(()))
    }
}

fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64() != Some(0.0),
        Some(JsonValue::Array(a)) => !a.is_empty(),
        Some(JsonValue::Object(o)) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trackid_format() {
        let trackid = generate_trackid();
        let groups: Vec<_> = trackid.split('-').collect();
        assert_eq!(groups.len(), 4);
        assert!(groups.iter().all(|g| g.len() == 8));
        assert!(trackid
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_game_shapes() {
        assert_eq!(GameShape::of("当日玩游戏10分钟"), Some(GameShape::Daily));
        assert_eq!(GameShape::of("首次玩斗罗大陆10分钟"), Some(GameShape::FirstPlay));
        assert_eq!(GameShape::of("首次玩斗罗大陆10分钟得奖励"), None);
        assert_eq!(GameShape::of("看视频"), None);
    }

    #[test]
    fn test_game_targets() {
        assert_eq!(
            GameShape::Daily.game_target("https://qdgame.qidian.com/home?partnerid=42&x=1"),
            Some(("201796".to_string(), "42".to_string()))
        );
        assert_eq!(
            GameShape::FirstPlay
                .game_target("https://qdgame.qidian.com/game/555?from=a&partnerid=7"),
            Some(("555".to_string(), "7".to_string()))
        );
        assert_eq!(GameShape::FirstPlay.game_target("https://qdgame.qidian.com/home"), None);
    }

    #[test]
    fn test_required_seconds() {
        assert_eq!(required_seconds(10), 660);
        assert_eq!(required_seconds(0), 60);
        assert_eq!(required_seconds(-3), 60);
        assert_eq!(required_seconds(i64::MAX), i64::MAX as u64);
    }
}
