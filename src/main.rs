use anyhow::Result;
use qidian_job::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 配置文件路径（QIDIAN_CONFIG 可覆盖）
    let config = Config::from_env();

    // 初始化并运行应用（日志在读取配置后初始化）
    App::initialize(&config.config_path).await?.run().await?;

    Ok(())
}
