use std::path::PathBuf;
use thiserror::Error;

/// A computation needed columns the current data does not carry.
///
/// Callers treat this as "feature unavailable for current data" and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{feature} unavailable for current data: missing column(s) {}", .columns.join(", "))]
    MissingColumns {
        feature: &'static str,
        columns: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("cannot read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
