//! 节奏控制 - 基础设施层
//!
//! 所有刻意的等待（请求前随机延迟、重试间隔、心跳间隔）都经过这里

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// 等待能力
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 真实等待
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 节奏控制器
#[derive(Clone)]
pub struct Pacer {
    sleeper: Arc<dyn Sleeper>,
}

impl Pacer {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self { sleeper }
    }

    /// 每个签名请求前的随机延迟（1~3 秒）
    pub async fn before_request(&self) {
        self.sleeper.sleep(jitter(1000, 3000)).await;
    }

    /// 子任务之间、重试之间的短暂停顿（1~2 秒）
    pub async fn short_pause(&self) {
        self.sleeper.sleep(jitter(1000, 2000)).await;
    }

    /// 服务端指定的等待
    pub async fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Arc::new(TokioSleeper))
    }
}

/// [min_ms, max_ms] 内的随机时长
pub fn jitter(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}
