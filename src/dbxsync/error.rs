//! Error taxonomy for a synchronization run.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every variant is fatal to the run. The sole recovered condition in the
/// program is a "not found" listing result, which never surfaces as an error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid command line input
    #[error("Config Error -- {0}")]
    Config(String),

    /// A local traversal, stat, or open failure
    #[error("Filesystem Error -- {path:?}: {source}")]
    Filesystem { path: PathBuf, source: io::Error },

    /// A listing or upload failure reported by the remote API
    #[error("Remote Error -- {0}")]
    Remote(String),
}

impl SyncError {
    pub(crate) fn filesystem(path: &Path, source: io::Error) -> SyncError {
        SyncError::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}
