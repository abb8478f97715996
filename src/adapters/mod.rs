//! Adapters layer: Concrete implementations of ports.
//!
//! - `delimited`: delimited text files for datasets, hierarchies and
//!   released output
//! - `json`: configuration files and result reports

use std::path::PathBuf;

use crate::domain::{DataError, HierarchyError};

pub mod delimited;
pub mod json;

/// Error type for file-based sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} contains no rows", .0.display())]
    EmptyFile(PathBuf),

    #[error("Invalid data in {}: {source}", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: DataError,
    },

    #[error("Invalid hierarchy in {}: {source}", path.display())]
    Hierarchy {
        path: PathBuf,
        #[source]
        source: HierarchyError,
    },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Configuration {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write {value:?} to {}: it would not read back unchanged", path.display())]
    Unencodable { path: PathBuf, value: String },
}
