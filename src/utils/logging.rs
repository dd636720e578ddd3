/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置文件中的级别
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(total_users: usize, retry_attempts: usize) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("👥 待处理用户: {} 个", total_users);
    info!("🔁 单任务最大尝试次数: {}", retry_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录用户开始处理
pub fn log_account_start(index: usize, total: usize, username: &str) {
    info!("\n{}", "=".repeat(60));
    info!("👤 开始处理第 {}/{} 个用户: {}", index, total, username);
    info!("{}", "=".repeat(60));
}

/// 记录用户处理完成
pub fn log_account_complete(index: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ [用户 {}] 处理完成: 成功 {}/{}", index, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(processed: usize, skipped: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已处理: {}/{}", processed, total);
    info!("⏭️ 跳过: {}", skipped);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("验证码票据内容", 3), "验证码...");
    }
}
