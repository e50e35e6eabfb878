//! 批量模拟编排 - 编排层
//!
//! ## 职责
//!
//! 1. **候选准备**：表达式 → 参数策略 → `Vec<Candidate>`
//! 2. **断点续传**：通过 TestLedger 跳过已测试的候选
//! 3. **顺序模拟**：逐个交给 JobPoller，条目之间固定暂停
//! 4. **无条件记录**：成功、不合格、出错都写入 TestLedger
//! 5. **中断处理**：收到中断信号后停止迭代、落盘、向上返回 `Interrupted`
//!
//! 单个候选的失败不会中断批次。

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::clients::BrainApi;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::ShutdownSignal;
use crate::models::{Candidate, Category};
use crate::services::{AlphaStore, ParameterPolicy, TestLedger};
use crate::utils::logging;
use crate::workflow::{JobCtx, JobPoller, JobState};

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// 过滤前的候选数量
    pub original_count: usize,
    /// 因已测试而跳过的数量
    pub skipped: usize,
    /// 本次实际模拟的数量
    pub tested: usize,
    /// 出错的数量
    pub errored: usize,
    /// 合格的 Alpha ID（待提交）
    pub qualified: Vec<String>,
}

pub struct BatchOrchestrator<'a, A: BrainApi + ?Sized> {
    api: &'a A,
    store: &'a AlphaStore,
    item_pause: Duration,
    settle_delay: Duration,
}

impl<'a, A: BrainApi + ?Sized> BatchOrchestrator<'a, A> {
    pub fn new(api: &'a A, store: &'a AlphaStore, config: &Config) -> Self {
        Self {
            api,
            store,
            item_pause: config.item_pause(),
            settle_delay: config.settle_delay(),
        }
    }

    /// 为每个表达式选择参数，生成候选
    pub fn prepare_candidates<R: Rng>(
        expressions: &[String],
        policy: &mut ParameterPolicy<R>,
        dataset_universe: Option<&str>,
    ) -> Vec<Candidate> {
        info!("开始智能参数配置...");
        if let Some(universe) = dataset_universe {
            info!("数据集约束: Universe={}", universe);
        }

        let candidates: Vec<Candidate> = expressions
            .iter()
            .map(|expression| {
                let params = policy.select_parameters(expression, dataset_universe);
                Candidate::new(expression.as_str(), &params)
            })
            .collect();

        let mut counts: Vec<(Category, usize)> = Vec::new();
        for candidate in &candidates {
            match counts.iter_mut().find(|(c, _)| *c == candidate.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((candidate.category, 1)),
            }
        }

        info!("\n表达式类型分布:");
        for (category, count) in &counts {
            info!("  {}: {} 个Alpha", category, count);
        }
        info!("智能参数配置完成，共生成 {} 个优化配置", candidates.len());

        candidates
    }

    /// 运行整个批次
    ///
    /// 收到中断信号时，正在进行的候选被放弃（不记录），已记录的条目立即落盘，
    /// 返回 `AppError::Interrupted`
    pub async fn run(
        &self,
        ledger: &mut TestLedger,
        candidates: Vec<Candidate>,
        shutdown: &mut ShutdownSignal,
    ) -> AppResult<BatchReport> {
        let original_count = candidates.len();
        let (pending, skipped) = ledger.filter_untested(candidates);
        logging::log_resume_filter(original_count, skipped, pending.len());

        let mut report = BatchReport {
            original_count,
            skipped,
            ..Default::default()
        };

        if pending.is_empty() {
            info!("没有需要测试的新表达式");
            ledger.finalize_session()?;
            return Ok(report);
        }

        info!("\n开始模拟 {} 个 Alpha 表达式...", pending.len());

        let completed = {
            let batch = self.run_pending(ledger, &pending, &mut report);
            tokio::select! {
                biased;
                _ = shutdown.recv() => false,
                _ = batch => true,
            }
        };

        if !completed {
            warn!("\n用户中断，已测试 {} 个Alpha表达式", report.tested);
            ledger.interrupt()?;
            return Err(AppError::Interrupted {
                session_tested: ledger.stats().session_tested,
            });
        }

        ledger.finalize_session()?;
        logging::print_batch_stats(
            report.tested,
            report.qualified.len(),
            report.errored,
            report.skipped,
        );

        Ok(report)
    }

    async fn run_pending(
        &self,
        ledger: &mut TestLedger,
        pending: &[Candidate],
        report: &mut BatchReport,
    ) {
        let poller = JobPoller::new(self.api, self.settle_delay);

        for (i, candidate) in pending.iter().enumerate() {
            let ctx = JobCtx::new(report.skipped + i + 1, report.original_count);
            info!("\n{} 正在模拟 Alpha...", ctx);

            let result = poller.evaluate(candidate).await;
            let params = candidate.parameters();

            match JobState::of(&result) {
                JobState::Errored => report.errored += 1,
                JobState::Qualified => info!("{} ✅ 发现合格 Alpha", ctx),
                _ => {}
            }

            match &result {
                Ok(outcome) => {
                    ledger.mark_tested(&candidate.expression, &params, Some(outcome));
                    if outcome.passed_all_checks {
                        if let Err(e) = self.store.save(outcome) {
                            error!("{} ❌ 保存合格 Alpha 失败: {}", ctx, e);
                        }
                        report.qualified.push(outcome.alpha_id.clone());
                    }
                }
                Err(e) => {
                    error!("{} ❌ Alpha 模拟失败: {}", ctx, e);
                    ledger.mark_tested(&candidate.expression, &params, None);
                }
            }
            report.tested += 1;

            if i + 1 < pending.len() {
                sleep(self.item_pause).await;
            }
        }
    }
}
