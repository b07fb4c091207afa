use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::PathString;

/// Error type for configuration, input, and page-generation failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to parse JSON from '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("malformed cascade: {0}")]
    MalformedCascade(String),
    #[error("base valuation must be a positive amount, got {0}")]
    InvalidValuation(u64),
    #[error("output path '{0}' resolved for more than one page")]
    PathCollision(PathString),
    #[error("failed to render page '{path}': {reason}")]
    Render { path: PathString, reason: String },
}
