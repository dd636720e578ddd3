//! 任务执行上下文
//!
//! 封装"我正在处理第几个账号"这一信息，只用于日志前缀

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct TaskCtx {
    /// 账号序号（从 1 开始）
    pub account_index: usize,
    pub username: String,
}

impl TaskCtx {
    pub fn new(account_index: usize, username: impl Into<String>) -> Self {
        Self {
            account_index,
            username: username.into(),
        }
    }
}

impl Display for TaskCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[用户 {}]", self.account_index)
    }
}
