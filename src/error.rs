//! Error types for loading, saving and exporting vivarium data.

use thiserror::Error;

/// Errors surfaced by file I/O, parsing and export paths.
///
/// The simulation core itself never fails; only the edges that touch the
/// filesystem, JSON documents or the browser produce these.
#[derive(Debug, Error)]
pub enum VivariumError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    /// A configuration value is outside its usable range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Browser download could not be triggered (wasm only).
    #[error("Download failed: {0}")]
    Download(String),
}

impl VivariumError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, VivariumError>;
