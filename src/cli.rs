//! 命令行参数与交互菜单
//!
//! 命令行已给出的选项直接使用，缺失的选项通过菜单询问。

use clap::Parser;
use std::io::{self, BufRead, Write};

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::DatasetCatalog;
use crate::orchestrator::{RunMode, RunPlan};
use crate::services::StrategyMode;

#[derive(Parser, Debug, Default)]
#[command(name = "alpha_batch_submit")]
#[command(about = "批量 Alpha 模拟与提交（支持断点续传）")]
pub struct Cli {
    /// 清除断点续传记录后退出，不进入菜单
    #[arg(long)]
    pub clear_resume: bool,

    /// 运行模式：1 自动 / 2 仅测试 / 3 仅提交 / 4 清除记录
    #[arg(long, env = "ALPHA_MODE")]
    pub mode: Option<RunMode>,

    /// 数据集编号或名称
    #[arg(long, env = "ALPHA_DATASET")]
    pub dataset: Option<String>,

    /// 策略模式：1 基础 / 2 多因子组合
    #[arg(long, env = "ALPHA_STRATEGY")]
    pub strategy: Option<StrategyMode>,

    /// 仅提交模式下要提交的数量
    #[arg(long)]
    pub count: Option<usize>,

    /// 跳过清除确认
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 生成运行计划；用户取消时返回 None
    pub fn resolve_plan(&self, catalog: &DatasetCatalog) -> AppResult<Option<RunPlan>> {
        let stdin = io::stdin();
        self.resolve_plan_with(catalog, &mut stdin.lock())
    }

    /// 从给定输入读取缺失的选项
    pub fn resolve_plan_with(
        &self,
        catalog: &DatasetCatalog,
        input: &mut impl BufRead,
    ) -> AppResult<Option<RunPlan>> {
        let mode = match self.mode {
            Some(mode) => mode,
            None => {
                println!("\n📋 请选择运行模式:");
                println!("1: 自动模式 (测试并自动提交合格 Alpha)");
                println!("2: 仅测试模式 (测试并保存合格 Alpha ID)");
                println!("3: 仅提交模式 (提交已保存的合格 Alpha ID)");
                println!("4: 清除断点续传记录");
                prompt(input, "\n请选择模式 (1-4): ")?.parse()?
            }
        };

        let plan = match mode {
            RunMode::Auto | RunMode::TestOnly => {
                let key = match &self.dataset {
                    Some(key) => key.clone(),
                    None => {
                        println!("\n📊 可用数据集列表:");
                        for line in catalog.listing() {
                            println!("{}", line);
                        }
                        prompt(input, "\n请选择数据集编号: ")?
                    }
                };
                let dataset = catalog
                    .resolve(&key)
                    .cloned()
                    .ok_or(ConfigError::UnknownDataset { name: key })?;

                let strategy = match self.strategy {
                    Some(strategy) => strategy,
                    None => {
                        println!("\n📈 可用策略模式:");
                        println!("1: 基础策略模式");
                        println!("2: 多因子组合模式");
                        prompt(input, "\n请选择策略模式 (1-2): ")?.parse()?
                    }
                };

                RunPlan::Test {
                    dataset,
                    strategy,
                    auto_submit: mode == RunMode::Auto,
                }
            }
            RunMode::SubmitOnly => {
                let count = match self.count {
                    Some(count) => count,
                    None => {
                        let answer = prompt(input, "\n请输入要提交的 Alpha 数量: ")?;
                        answer
                            .parse()
                            .map_err(|_| AppError::Other(format!("无效的提交数量: {}", answer)))?
                    }
                };
                if count == 0 {
                    return Err(AppError::Other("无效的提交数量: 0".to_string()));
                }
                RunPlan::Submit { count }
            }
            RunMode::ClearResume => {
                let confirmed = self.yes
                    || prompt(input, "\n⚠️ 确认清除所有断点续传记录？(y/N): ")?
                        .eq_ignore_ascii_case("y");
                if !confirmed {
                    println!("❌ 操作已取消");
                    return Ok(None);
                }
                RunPlan::Clear
            }
        };

        Ok(Some(plan))
    }
}

fn prompt(input: &mut impl BufRead, question: &str) -> AppResult<String> {
    print!("{}", question);
    io::stdout()
        .flush()
        .map_err(|e| AppError::file_write_failed("stdout", e))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| AppError::file_read_failed("stdin", e))?;
    Ok(line.trim().to_string())
}
