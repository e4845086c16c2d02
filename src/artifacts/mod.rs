//! Persisted training artifacts
//!
//! The training pipeline writes models, the preprocessing bundle and run
//! records here; the prediction service reads them back at startup.

mod record;
mod store;

pub use record::RunRecord;
pub use store::{model_file_name, ArtifactStore, BUNDLE_FILE, HISTORY_FILE, LATEST_RUN_FILE};
