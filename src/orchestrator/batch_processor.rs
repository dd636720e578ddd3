//! 多账号处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责账号列表的处理和共享资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：读取配置、启动日志、创建 HTTP 客户端与外部服务适配器
//! 2. **账号加载**：校验并加载所有用户（无效用户直接跳过）
//! 3. **顺序处理**：一次只处理一个账号，委托 account_processor 执行任务
//! 4. **结果推送**：每个账号处理完后按其推送配置发送汇总
//! 5. **cookies 持久化**：开启 `save_cookies` 时写回 cookies 文件
//! 6. **全局统计**：汇总所有账号的处理结果

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::clients::{
    CaptchaOracle, HttpCaptchaOracle, HttpSigningOracle, QidianClient, SigningOracle,
};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{HttpTransport, Pacer, ReqwestTransport};
use crate::models::account::AccountSession;
use crate::models::loaders::{self, LoadedAccount};
use crate::models::FileConfig;
use crate::orchestrator::account_processor::{self, AccountReport};
use crate::services::{build_channel, CaptchaResolver, Notifier, PushChannel};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    file_config: FileConfig,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn SigningOracle>,
    resolver: CaptchaResolver,
    pacer: Pacer,
}

/// 整次运行的结果
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 配置中的用户总数
    pub total: usize,
    pub reports: Vec<AccountReport>,
    pub skipped: usize,
}

impl App {
    /// 读取配置文件并初始化应用
    pub async fn initialize(config_path: &str) -> Result<Self> {
        let file_config = loaders::load_config_file(Path::new(config_path))
            .await
            .with_context(|| format!("读取配置文件 {} 失败", config_path))?;

        let mut config = Config::resolve(&file_config.settings);
        config.config_path = config_path.to_string();
        logging::init(config.tracing_level());

        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new().context("创建 HTTP 客户端失败")?);
        let signer = Arc::new(HttpSigningOracle::new(
            config.signing_oracle_url.clone(),
            transport.clone(),
        ));
        let captcha_oracle = Arc::new(HttpCaptchaOracle::new(
            config.captcha_oracle_url.clone(),
            transport.clone(),
        ));

        Ok(Self::with_components(
            config,
            file_config,
            transport,
            signer,
            captcha_oracle,
            Pacer::default(),
        ))
    }

    /// 使用给定的组件组装应用
    pub fn with_components(
        config: Config,
        file_config: FileConfig,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn SigningOracle>,
        captcha_oracle: Arc<dyn CaptchaOracle>,
        pacer: Pacer,
    ) -> Self {
        let resolver = CaptchaResolver::new(captcha_oracle, config.captcha_max_attempts);
        Self {
            config,
            file_config,
            transport,
            signer,
            resolver,
            pacer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        let total = self.file_config.users.len();
        logging::log_startup(total, self.config.retry_attempts);

        let accounts = loaders::load_accounts(&self.file_config).await;
        if accounts.is_empty() {
            warn!("⚠️ 没有可处理的用户，程序结束");
        }

        let mut summary = RunSummary {
            total,
            skipped: total - accounts.len(),
            ..Default::default()
        };

        for (index, account) in accounts.iter().enumerate() {
            let account_index = index + 1;
            logging::log_account_start(account_index, accounts.len(), &account.user.username);

            match self.process_loaded_account(account_index, account).await {
                Ok(Some(report)) => {
                    logging::log_account_complete(
                        account_index,
                        report.success_count(),
                        report.results.len(),
                    );
                    summary.reports.push(report);
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        "[用户 {}] ❌ 处理用户[{}]时发生错误: {}",
                        account_index, account.user.username, e
                    );
                    summary.skipped += 1;
                }
            }
        }

        logging::print_final_stats(summary.reports.len(), summary.skipped, total);
        Ok(summary)
    }

    /// 处理单个账号：建立会话 → 执行任务 → 推送 → 保存 cookies
    async fn process_loaded_account(
        &self,
        account_index: usize,
        account: &LoadedAccount,
    ) -> AppResult<Option<AccountReport>> {
        let session = AccountSession::new(
            &account.user,
            account.cookies.clone(),
            &self.config.default_user_agent,
        )?;
        let client = QidianClient::connect(
            session,
            self.transport.clone(),
            self.signer.clone(),
            self.pacer.clone(),
        )
        .await?;

        let Some(report) = account_processor::process_account(
            &client,
            &self.resolver,
            account_index,
            self.config.retry_attempts,
        )
        .await
        else {
            return Ok(None);
        };

        let notifier = Notifier::new(self.build_channels(account));
        notifier.notify(&report.username, &report.results).await;

        if self.config.save_cookies {
            let path = account.user.cookies_path();
            let cookies = client.session().cookies();
            if let Err(e) = loaders::save_cookies(Path::new(&path), &cookies).await {
                error!("[用户 {}] 保存cookies失败: {}", account_index, e);
            }
        }
        client.log_session();

        Ok(Some(report))
    }

    fn build_channels(&self, account: &LoadedAccount) -> Vec<Box<dyn PushChannel>> {
        account
            .push_services
            .iter()
            .filter_map(|push| match build_channel(push, self.transport.clone()) {
                Ok(channel) => Some(channel),
                Err(e) => {
                    error!("用户[{}] 推送服务配置错误: {}", account.user.username, e);
                    None
                }
            })
            .collect()
    }
}

impl RunSummary {
    pub fn report(&self, username: &str) -> Option<&AccountReport> {
        self.reports.iter().find(|r| r.username == username)
    }
}
