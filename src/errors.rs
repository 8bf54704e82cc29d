// src/errors.rs

use std::path::PathBuf;

use crate::document::XmlDiagnostic;
use crate::models::OutcomeId;

/// Errors raised while extracting, clustering or rendering a trial.
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("Supplied trial data file '{}' does not exist", .0.display())]
    InputNotFound(PathBuf),

    #[error(
        "Supplied input file is not valid XML and could not be parsed ({} diagnostics)",
        .diagnostics.len()
    )]
    MalformedDocument { diagnostics: Vec<XmlDiagnostic> },

    #[error("Unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("Unknown outcome id: {0}")]
    UnknownOutcome(OutcomeId),

    #[error("Render group partition violated: {0}")]
    PartitionViolation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Workbook error: {0}")]
    Render(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsolidationError>;
