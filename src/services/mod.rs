pub mod alpha_store;
pub mod expression_generator;
pub mod parameter_policy;
pub mod qualification;
pub mod test_ledger;

pub use alpha_store::AlphaStore;
pub use expression_generator::{fetch_matrix_fields, ExpressionProducer, StrategyMode, TemplateStrategy};
pub use parameter_policy::{classify, ParameterPolicy};
pub use qualification::{evaluate, Verdict};
pub use test_ledger::{Fingerprint, LedgerEntry, ResumeStats, TestLedger};
