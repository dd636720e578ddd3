//! # Qidian Job
//!
//! 起点读书每日福利任务自动化
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 客户端、计时器），只暴露能力
//! - `HttpTransport` - 唯一的 HTTP client owner，提供 send() 能力
//! - `Pacer` - 所有刻意的等待都经过这里
//!
//! ### ② 业务能力层（Clients / Services）
//! - `clients/` - 签名请求、签名服务、验证码服务
//! - `CaptchaResolver` - 验证码状态机
//! - `Notifier` - 结果推送（飞书 / Server酱 / 企业微信）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的完整处理流程
//! - `TaskCtx` - 上下文封装（账号序号 + 用户名）
//! - `TaskFlow` - 签到 / 激励碎片 / 章节卡 / 游戏中心 / 每日抽奖
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 多账号处理器，管理共享资源
//! - `orchestrator/account_processor` - 单个账号处理器，负责重试
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{HttpTransport, Pacer};
pub use models::{TaskKind, TaskOutcome};
pub use orchestrator::{App, RunSummary};
pub use workflow::{TaskCtx, TaskFlow};
