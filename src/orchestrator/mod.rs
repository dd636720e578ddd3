//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 多账号处理器
//! - 管理应用生命周期（初始化、运行）
//! - 持有共享资源（HTTP 客户端、签名服务、验证码服务）
//! - 顺序处理每个账号并推送结果
//!
//! ### `account_processor` - 单个账号处理器
//! - 登录检测
//! - 按固定顺序执行任务，负责重试
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Account>)
//!     ↓
//! account_processor (处理 Vec<TaskKind>)
//!     ↓
//! workflow::TaskFlow (处理单个任务)
//!     ↓
//! services / clients (验证码、推送、签名请求)
//!     ↓
//! infrastructure (HttpTransport / Pacer)
//! ```

pub mod account_processor;
pub mod batch_processor;

pub use account_processor::{process_account, run_task, AccountReport};
pub use batch_processor::{App, RunSummary};
