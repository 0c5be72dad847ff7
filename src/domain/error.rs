// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure below the CLI is one of these variants. None of
// them is recovered from: the training loop propagates them with
// `?` and the process exits with the error chain.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    /// Malformed or inconsistent hyper-parameters, detected before training.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Empty or malformed feature data.
    #[error("data error: {0}")]
    Data(String),

    /// Numeric failure inside a forward/backward pass.
    #[error("computation error: {0}")]
    Computation(String),

    /// Checkpoint directory or file could not be created, listed, removed or written.
    #[error("persistence error at '{}': {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Model parameters could not be serialised.
    #[error("record error: {0}")]
    Record(String),
}

impl TrainError {
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persistence { path: path.into(), source }
    }
}
