use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, enhancing or exporting tables
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid html selector: {0}")]
    Selector(String),

    #[error("failed to read config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("theme error: {0}")]
    Theme(String),

    /// The live table changed shape underneath an operation
    #[error("malformed table: {0}")]
    Structure(String),

    #[error("no table at index {0}")]
    NoSuchTable(usize),

    #[error("panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, EnhanceError>;
