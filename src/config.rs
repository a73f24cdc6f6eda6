use crate::store::DEFAULT_DATA_FILE;
use std::path::PathBuf;

/// Startup configuration, read from the environment once.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    /// Dataset file name inside the workspace.
    pub data_file: String,
    /// `EnvFilter` directives for stderr logging.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            data_file: DEFAULT_DATA_FILE.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            workspace: non_empty("GRADEBOOKD_WORKSPACE").map(PathBuf::from),
            data_file: non_empty("GRADEBOOKD_DATA_FILE").unwrap_or(default.data_file),
            log_filter: non_empty("GRADEBOOKD_LOG").unwrap_or(default.log_filter),
        }
    }
}
