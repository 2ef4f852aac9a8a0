//! Input resolution: read markup from a local file, stdin, or an HTTP(S) URL.
//!
//! The converter works on an in-memory string, so every input kind is read
//! fully and validated as UTF-8 before conversion starts.

use crate::error::ConvertError;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Markup read from one input, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// The path, URL, or `-` the markup was read from.
    pub source: String,
    pub markup: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string names standard input.
pub fn is_stdin(input: &str) -> bool {
    input == "-"
}

/// Read the input's markup.
///
/// URLs are downloaded, `-` reads stdin to the end, anything else is a path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ConvertError> {
    if input.trim().is_empty() {
        return Err(ConvertError::InvalidInput {
            input: input.to_string(),
        });
    }
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else if is_stdin(input) {
        read_stdin().await?
    } else {
        read_local(input).await?
    };
    let markup = decode_utf8(input, bytes)?;
    Ok(ResolvedInput {
        source: input.to_string(),
        markup,
    })
}

/// Validate `bytes` as UTF-8 (a leading BOM is stripped).
pub fn decode_utf8(source_name: &str, bytes: Vec<u8>) -> Result<String, ConvertError> {
    let mut markup = String::from_utf8(bytes).map_err(|e| ConvertError::NotUtf8 {
        source_name: source_name.to_string(),
        offset: e.utf8_error().valid_up_to(),
    })?;
    if markup.starts_with('\u{FEFF}') {
        markup.replace_range(..'\u{FEFF}'.len_utf8(), "");
    }
    Ok(markup)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, ConvertError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ConvertError::FileNotFound { path })
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ConvertError::PermissionDenied { path })
        }
        Err(e) => Err(ConvertError::ReadFailed {
            source_name: path_str.to_string(),
            source: e,
        }),
    }
}

async fn read_stdin() -> Result<Vec<u8>, ConvertError> {
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| ConvertError::ReadFailed {
            source_name: "<stdin>".to_string(),
            source: e,
        })?;
    debug!("Read {} bytes from stdin", bytes.len());
    Ok(bytes)
}

/// Download a URL and return the response body.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, ConvertError> {
    info!("Downloading markup from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
