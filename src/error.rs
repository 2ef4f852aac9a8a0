//! Error types for the canvas2notion library.
//!
//! The converter itself never fails: malformed or unsupported markup degrades
//! to a no-op or a fallback block. Errors only arise at the edges, when reading
//! input, downloading it, or writing results. Two types reflect two failure
//! modes:
//!
//! * [`ConvertError`]: **Fatal**: the requested operation cannot proceed
//!   (input missing, output not writable, invalid configuration).
//!
//! * [`DocumentError`]: **Non-fatal**: one document in a batch could not be
//!   read, but the others are fine. Stored in
//!   [`crate::output::DocumentResult`] so callers can inspect partial success.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the canvas2notion library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path, `-`, nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path, '-', or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The input bytes are not valid UTF-8.
    #[error("Input '{source_name}' is not valid UTF-8 (first bad byte at offset {offset})")]
    NotUtf8 { source_name: String, offset: usize },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// Reading a local file or stdin failed after it was opened.
    #[error("Failed to read '{source_name}': {source}")]
    ReadFailed {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Blocks could not be serialised to JSON.
    #[error("Failed to serialise blocks: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document in a batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The document could not be read from disk or stdin.
    #[error("Document {index} ('{source_name}'): read failed: {detail}")]
    ReadFailed {
        index: usize,
        source_name: String,
        detail: String,
    },

    /// The document URL could not be fetched.
    #[error("Document {index} ('{source_name}'): download failed: {detail}")]
    DownloadFailed {
        index: usize,
        source_name: String,
        detail: String,
    },

    /// The conversion task itself panicked or was cancelled.
    #[error("Document {index} ('{source_name}'): conversion task failed: {detail}")]
    TaskFailed {
        index: usize,
        source_name: String,
        detail: String,
    },
}

impl DocumentError {
    /// Classify a fatal per-document error into its batch counterpart.
    pub fn from_convert(index: usize, source_name: &str, err: &ConvertError) -> Self {
        let source_name = source_name.to_string();
        let detail = err.to_string();
        match err {
            ConvertError::DownloadFailed { .. } | ConvertError::DownloadTimeout { .. } => {
                DocumentError::DownloadFailed {
                    index,
                    source_name,
                    detail,
                }
            }
            ConvertError::Internal(_) => DocumentError::TaskFailed {
                index,
                source_name,
                detail,
            },
            _ => DocumentError::ReadFailed {
                index,
                source_name,
                detail,
            },
        }
    }
}
