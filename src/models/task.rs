use std::fmt::{self, Display};

use crate::models::risk::RiskDescriptor;

/// 任务种类（执行顺序即声明顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    /// 签到
    CheckIn,
    /// 激励碎片
    Fragments,
    /// 章节卡（额外激励）
    BonusUnlock,
    /// 游戏中心
    Game,
    /// 每日抽奖
    Lottery,
}

/// 配置文件中的任务名 → 任务种类
static TASK_NAMES: phf::Map<&'static str, TaskKind> = phf::phf_map! {
    "签到任务" => TaskKind::CheckIn,
    "激励碎片任务" => TaskKind::Fragments,
    "章节卡任务" => TaskKind::BonusUnlock,
    "额外激励任务" => TaskKind::BonusUnlock,
    "游戏中心任务" => TaskKind::Game,
    "每日抽奖任务" => TaskKind::Lottery,
};

impl TaskKind {
    /// 固定执行顺序
    pub const ORDER: [TaskKind; 5] = [
        TaskKind::CheckIn,
        TaskKind::Fragments,
        TaskKind::BonusUnlock,
        TaskKind::Game,
        TaskKind::Lottery,
    ];

    /// 标准名称（也用于推送）
    pub fn name(self) -> &'static str {
        match self {
            TaskKind::CheckIn => "签到任务",
            TaskKind::Fragments => "激励碎片任务",
            TaskKind::BonusUnlock => "章节卡任务",
            TaskKind::Game => "游戏中心任务",
            TaskKind::Lottery => "每日抽奖任务",
        }
    }

    /// 从配置中的任务名解析
    pub fn from_config_key(key: &str) -> Option<Self> {
        TASK_NAMES.get(key.trim()).copied()
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个任务的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// 完成
    Success,
    /// 明确失败
    Failed { reason: String },
    /// 意外异常（可重试）
    Error { reason: String },
    /// 触发风控，但验证码类型不支持（本次运行不再重试）
    Captcha { reason: String, risk: RiskDescriptor },
    /// 触发风控，验证码未能解决（本次运行不再重试）
    CaptchaFailed { reason: String, risk: RiskDescriptor },
}

impl TaskOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        TaskOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        TaskOutcome::Error {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    /// 是否属于验证码类结果
    pub fn is_captcha_family(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Captcha { .. } | TaskOutcome::CaptchaFailed { .. }
        )
    }

    /// 状态名（与推送、日志中的状态词一致）
    pub fn status(&self) -> &'static str {
        match self {
            TaskOutcome::Success => "success",
            TaskOutcome::Failed { .. } => "failed",
            TaskOutcome::Error { .. } => "error",
            TaskOutcome::Captcha { .. } => "captcha",
            TaskOutcome::CaptchaFailed { .. } => "captcha_failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TaskOutcome::Success => None,
            TaskOutcome::Failed { reason }
            | TaskOutcome::Error { reason }
            | TaskOutcome::Captcha { reason, .. }
            | TaskOutcome::CaptchaFailed { reason, .. } => Some(reason),
        }
    }

    pub fn risk(&self) -> Option<&RiskDescriptor> {
        match self {
            TaskOutcome::Captcha { risk, .. } | TaskOutcome::CaptchaFailed { risk, .. } => {
                Some(risk)
            }
            _ => None,
        }
    }
}
