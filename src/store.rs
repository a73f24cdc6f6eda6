use crate::error::{GradebookError, Result};
use crate::model::Dataset;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_DATA_FILE: &str = "groups.json";

/// Whole-file JSON store. Every call reads or rewrites the entire dataset;
/// there is no locking, so concurrent writers race and the last save wins.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    /// Store for `file_name` inside a workspace directory, creating the directory.
    pub fn open_workspace(workspace: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(workspace).map_err(|e| GradebookError::storage(workspace, e))?;
        Ok(Store::new(workspace.join(file_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Dataset> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "initializing empty data file");
            self.save(&Dataset::default())?;
        }
        // A file that exists but cannot be read as text is corrupt, not a storage fault.
        let text = fs::read_to_string(&self.path).map_err(|e| GradebookError::CorruptData {
            path: self.path.clone(),
            message: format!("unreadable data file: {e}"),
        })?;
        let dataset = parse_dataset(&text).map_err(|message| GradebookError::CorruptData {
            path: self.path.clone(),
            message,
        })?;
        debug!(path = %self.path.display(), groups = dataset.groups.len(), "loaded dataset");
        Ok(dataset)
    }

    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let text = serde_json::to_string_pretty(dataset).map_err(|e| {
            GradebookError::storage(&self.path, std::io::Error::new(std::io::ErrorKind::Other, e))
        })?;
        write_atomic(&self.path, text.as_bytes())?;
        debug!(path = %self.path.display(), groups = dataset.groups.len(), "saved dataset");
        Ok(())
    }
}

/// Parses and validates a dataset document.
pub fn parse_dataset(text: &str) -> std::result::Result<Dataset, String> {
    let dataset: Dataset = serde_json::from_str(text).map_err(|e| e.to_string())?;
    dataset.validate()?;
    Ok(dataset)
}

/// Writes next to `path` and renames over it so readers never see a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GradebookError::storage(parent, e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let written = File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(GradebookError::storage(path, e));
    }
    Ok(())
}
