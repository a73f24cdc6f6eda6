use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradebookError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    DuplicateName(String),

    #[error("data file {} is corrupt: {message}", path.display())]
    CorruptData { path: PathBuf, message: String },

    #[error("storage failure on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GradebookError {
    pub fn group_not_found(name: &str) -> Self {
        GradebookError::NotFound {
            entity: "group",
            key: name.to_string(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GradebookError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Wire code used in IPC error responses.
    pub fn code(&self) -> &'static str {
        match self {
            GradebookError::NotFound { .. } => "not_found",
            GradebookError::DuplicateName(_) => "duplicate_name",
            GradebookError::CorruptData { .. } => "corrupt_data",
            GradebookError::Storage { .. } => "storage_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;
