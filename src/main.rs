use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use alpha_batch_submit::cli::Cli;
use alpha_batch_submit::utils::logging;
use alpha_batch_submit::{App, Config, ShutdownSignal, TestLedger};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);

    if cli.clear_resume {
        TestLedger::load(&config.resume_file)
            .clear()
            .context("清除断点续传记录失败")?;
        return Ok(());
    }

    let resume_file = config.resume_file.clone();
    let mut app = App::initialize(config)
        .await
        .context("初始化应用失败")?;
    logging::log_resume_status(&app.resume_stats(), &resume_file);

    let Some(plan) = cli.resolve_plan(app.catalog())? else {
        return Ok(());
    };

    let mut shutdown = ShutdownSignal::install();
    match app.execute(plan, &mut shutdown).await {
        Err(e) if e.is_interrupted() => {
            warn!("\n⚠️ 用户中断操作");
            info!("💾 进度已自动保存，下次运行将从中断点继续");
            Ok(())
        }
        result => Ok(result?),
    }
}
