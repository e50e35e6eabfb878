//! 编排层（Orchestration Layer）
//!
//! ```text
//! app (运行模式、资源所有者)
//!     ↓
//! batch_orchestrator (处理 Vec<Candidate>，断点续传，中断)
//!     ↓
//! workflow::JobPoller / SubmissionDriver (处理单个候选 / 单个 Alpha)
//!     ↓
//! services (能力层：ledger / policy / qualification / store)
//!     ↓
//! clients (BrainApi)
//! ```

pub mod app;
pub mod batch_orchestrator;

pub use app::{App, RunMode, RunPlan};
pub use batch_orchestrator::{BatchOrchestrator, BatchReport};
