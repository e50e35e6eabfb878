//! 应用入口 - 编排层
//!
//! 持有客户端、断点续传记录、合格 Alpha 存储和参数策略，按运行计划调度：
//!
//! 1. 测试并自动提交前 `auto_submit_count` 个已保存的 Alpha
//! 2. 仅测试
//! 3. 仅提交已保存的 Alpha
//! 4. 清除断点续传记录

use tracing::{info, warn};

use crate::clients::{BrainApi, BrainClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::ShutdownSignal;
use crate::models::{load_catalog_or_builtin, DatasetCatalog, NamedDataset};
use crate::orchestrator::batch_orchestrator::{BatchOrchestrator, BatchReport};
use crate::services::{
    fetch_matrix_fields, AlphaStore, ExpressionProducer, ParameterPolicy, ResumeStats,
    StrategyMode, TemplateStrategy, TestLedger,
};
use crate::utils::logging;
use crate::workflow::{SubmissionDriver, SubmissionReport};

/// 运行模式（菜单编号 1-4）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 测试并自动提交
    Auto = 1,
    /// 仅测试
    TestOnly = 2,
    /// 仅提交
    SubmitOnly = 3,
    /// 清除断点续传记录
    ClearResume = 4,
}

impl std::str::FromStr for RunMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(RunMode::Auto),
            "2" => Ok(RunMode::TestOnly),
            "3" => Ok(RunMode::SubmitOnly),
            "4" => Ok(RunMode::ClearResume),
            other => Err(ConfigError::InvalidMode {
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// 一次运行要做的事情
#[derive(Debug, Clone)]
pub enum RunPlan {
    /// 模式 1 / 2
    Test {
        dataset: NamedDataset,
        strategy: StrategyMode,
        auto_submit: bool,
    },
    /// 模式 3
    Submit { count: usize },
    /// 模式 4 / --clear-resume
    Clear,
}

/// 应用主结构
pub struct App<A: BrainApi = BrainClient> {
    config: Config,
    api: A,
    ledger: TestLedger,
    store: AlphaStore,
    catalog: DatasetCatalog,
    policy: ParameterPolicy,
}

impl App<BrainClient> {
    /// 初始化应用：认证、加载断点续传记录和数据集目录
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let client = BrainClient::connect(&config).await?;
        logging::log_startup(client.base_url());

        let catalog = load_catalog_or_builtin(&config.dataset_catalog_file).await;
        Ok(Self::with_api(config, client, catalog))
    }
}

impl<A: BrainApi> App<A> {
    pub fn with_api(config: Config, api: A, catalog: DatasetCatalog) -> Self {
        let ledger = TestLedger::load(&config.resume_file);
        let store = AlphaStore::new(&config.alpha_ids_file, &config.alpha_details_file);
        Self {
            config,
            api,
            ledger,
            store,
            catalog,
            policy: ParameterPolicy::from_entropy(),
        }
    }

    /// 替换参数策略（固定种子）
    pub fn with_policy(mut self, policy: ParameterPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &TestLedger {
        &self.ledger
    }

    pub fn store(&self) -> &AlphaStore {
        &self.store
    }

    pub fn resume_stats(&self) -> ResumeStats {
        self.ledger.stats()
    }

    /// 执行运行计划
    pub async fn execute(&mut self, plan: RunPlan, shutdown: &mut ShutdownSignal) -> AppResult<()> {
        match plan {
            RunPlan::Test {
                dataset,
                strategy,
                auto_submit,
            } => {
                info!("\n🔄 开始Alpha模拟（支持Ctrl+C中断和断点续传）...");
                self.run_tests(&dataset, strategy, shutdown).await?;
                if auto_submit {
                    self.submit_saved(self.config.auto_submit_count, shutdown).await?;
                }
            }
            RunPlan::Submit { count } => {
                self.submit_saved(count, shutdown).await?;
            }
            RunPlan::Clear => self.clear_resume()?,
        }
        Ok(())
    }

    /// 拉取字段 → 生成表达式 → 参数配置 → 批量模拟
    pub async fn run_tests(
        &mut self,
        dataset: &NamedDataset,
        strategy: StrategyMode,
        shutdown: &mut ShutdownSignal,
    ) -> AppResult<BatchReport> {
        info!("📊 数据集: {} ({})", dataset.name, dataset.config.id);

        let fields = fetch_matrix_fields(&self.api, &dataset.config).await?;
        if fields.is_empty() {
            warn!("⚠️ 未找到可用的数据字段");
            return Ok(BatchReport::default());
        }

        let expressions = TemplateStrategy::new(strategy).produce(&fields);
        let candidates = BatchOrchestrator::<A>::prepare_candidates(
            &expressions,
            &mut self.policy,
            Some(dataset.config.universe.as_str()),
        );

        let orchestrator = BatchOrchestrator::new(&self.api, &self.store, &self.config);
        orchestrator.run(&mut self.ledger, candidates, shutdown).await
    }

    /// 提交已保存的前 `count` 个 Alpha，成功的从 ID 文件中移除
    ///
    /// 中断时同样先移除已成功的 ID，再返回 `AppError::Interrupted`
    pub async fn submit_saved(
        &self,
        count: usize,
        shutdown: &mut ShutdownSignal,
    ) -> AppResult<SubmissionReport> {
        let alpha_ids = self.store.load_ids()?;
        if alpha_ids.is_empty() {
            warn!("❌ 没有可提交的Alpha ID");
            return Ok(SubmissionReport::default());
        }

        info!("\n📝 已保存的Alpha ID列表:");
        for (i, alpha_id) in alpha_ids.iter().enumerate() {
            info!("{}. {}", i + 1, alpha_id);
        }

        let selected = &alpha_ids[..count.min(alpha_ids.len())];
        let driver = SubmissionDriver::new(&self.api, &self.config);
        let report = driver.submit_batch(selected, shutdown).await;

        logging::print_submission_stats(&report.accepted, &report.rejected);
        let remaining = self.store.remove_ids(&report.accepted)?;
        info!("剩余待提交 Alpha: {} 个", remaining);

        if report.interrupted {
            return Err(AppError::Interrupted {
                session_tested: self.ledger.stats().session_tested,
            });
        }

        Ok(report)
    }

    /// 清除断点续传记录
    pub fn clear_resume(&mut self) -> AppResult<()> {
        self.ledger.clear()?;
        info!("🗑️ 断点续传记录已清除");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parsing() {
        assert_eq!("1".parse::<RunMode>().unwrap(), RunMode::Auto);
        assert_eq!("4\n".parse::<RunMode>().unwrap(), RunMode::ClearResume);
        assert!(matches!(
            "5".parse::<RunMode>(),
            Err(AppError::Config(ConfigError::InvalidMode { .. }))
        ));
    }
}
