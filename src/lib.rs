//! # Alpha Batch Submit
//!
//! 批量生成、模拟并提交 Alpha 表达式，支持断点续传
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 远程服务边界 `BrainApi`，真实实现为 `BrainClient`
//!
//! ### ② 业务能力层（Services）
//! - `TestLedger` - 已测试指纹记录，周期落盘、中断落盘
//! - `ParameterPolicy` - 表达式分类与参数选择
//! - `qualification` - 固定阈值的提交资格检查
//! - `AlphaStore` - 合格 Alpha 的 ID 与详情
//! - `TemplateStrategy` - 字段 → 表达式
//!
//! ### ③ 流程层（Workflow）
//! - `JobPoller` - 单个候选：提交 → 长轮询 → 资格检查
//! - `SubmissionDriver` - 单个 Alpha：提交 → 长轮询，最多 5 次尝试
//!
//! ### ④ 编排层（Orchestration）
//! - `BatchOrchestrator` - 续传过滤、顺序模拟、无条件记录、中断处理
//! - `App` - 运行模式与资源所有者
//!
//! ### 基础设施（Infrastructure）
//! - `ShutdownSignal` - Ctrl+C / SIGTERM

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ApiResponse, BrainApi, BrainClient, Credentials};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::ShutdownSignal;
pub use models::{Candidate, Category, JobOutcome};
pub use orchestrator::{App, BatchOrchestrator, BatchReport, RunMode, RunPlan};
pub use services::{AlphaStore, ParameterPolicy, TestLedger};
pub use workflow::{JobPoller, SubmissionDriver, SubmissionReport};
