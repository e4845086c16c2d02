//! On-disk artifact directory shared by training and serving
//!
//! Layout:
//! - `<target>.json`    one serialized model per target (spaces → underscores)
//! - `preprocess.json`  the fitted preprocessing bundle
//! - `train_log.jsonl`  append-only run history
//! - `last_run.json`    latest run snapshot

use crate::error::{DietError, Result};
use super::record::RunRecord;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BUNDLE_FILE: &str = "preprocess.json";
pub const HISTORY_FILE: &str = "train_log.jsonl";
pub const LATEST_RUN_FILE: &str = "last_run.json";

/// File name of the model for a target
pub fn model_file_name(target: &str) -> String {
    format!("{}.json", target.replace(' ', "_"))
}

/// Handle to a model directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store, creating the directory if needed
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Open an existing store without creating anything
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DietError::ArtifactMissing(format!(
                "model directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn model_path(&self, target: &str) -> PathBuf {
        self.root.join(model_file_name(target))
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.root.join(BUNDLE_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    pub fn latest_run_path(&self) -> PathBuf {
        self.root.join(LATEST_RUN_FILE)
    }

    /// Write `bytes` to a sibling temp file, sync it, then rename over `path`
    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DietError::ArtifactMissing(format!("invalid artifact path {}", path.display())))?;
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
        if !path.exists() {
            return Err(DietError::ArtifactMissing(path.display().to_string()));
        }
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DietError::SerializationError(format!("Failed to read {}: {}", path.display(), e))
        })
    }

    /// Persist a model for a target, replacing any previous one
    pub fn save_model(&self, target: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.model_path(target);
        Self::write_atomic(&path, bytes)?;
        Ok(path)
    }

    /// Raw bytes of a target's model
    pub fn load_model_bytes(&self, target: &str) -> Result<Vec<u8>> {
        let path = self.model_path(target);
        if !path.exists() {
            return Err(DietError::ArtifactMissing(format!(
                "model for target '{}' not found at {}",
                target,
                path.display()
            )));
        }
        Ok(fs::read(path)?)
    }

    pub fn save_bundle<B: Serialize>(&self, bundle: &B) -> Result<()> {
        let bytes = serde_json::to_vec(bundle)?;
        Self::write_atomic(&self.bundle_path(), &bytes)
    }

    pub fn load_bundle<B: DeserializeOwned>(&self) -> Result<B> {
        Self::read_json(&self.bundle_path())
    }

    /// Append a run to the JSON-lines history
    pub fn append_history(&self, record: &RunRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All runs in the history log, oldest first
    pub fn read_history(&self) -> Result<Vec<RunRecord>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    pub fn write_latest_run(&self, record: &RunRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        Self::write_atomic(&self.latest_run_path(), &bytes)
    }

    pub fn read_latest_run(&self) -> Result<RunRecord> {
        Self::read_json(&self.latest_run_path())
    }

    /// Record a finished run: history first, then the latest snapshot
    pub fn record_run(&self, record: &RunRecord) -> Result<()> {
        self.append_history(record)?;
        self.write_latest_run(record)?;
        info!(
            history = %self.history_path().display(),
            latest = %self.latest_run_path().display(),
            "Recorded training run"
        );
        Ok(())
    }
}
