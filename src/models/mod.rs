pub mod category;
pub mod dataset;
pub mod loaders;
pub mod outcome;
pub mod settings;

pub use category::{Category, CategoryRules};
pub use dataset::{DatasetCatalog, DatasetConfig, NamedDataset};
pub use loaders::{load_catalog_or_builtin, load_dataset_catalog};
pub use outcome::{AlphaDetail, CheckStatus, IsMetrics, JobOutcome, SubCheck};
pub use settings::{Candidate, Neutralization, SelectedParameters, SimulationRequest, SimulationSettings};
