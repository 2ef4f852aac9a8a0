//! Conversion entry points.
//!
//! [`convert`] is the core operation: pure, synchronous, infallible. The other
//! functions wrap it with configuration, input reading, and output writing.
//! Use [`crate::stream::convert_stream`] for many documents at once.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::notion;
use crate::output::{Block, ConversionOutput};
use crate::pipeline::{input, postprocess, tokenize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Convert one markup fragment into blocks with the default configuration.
///
/// Deterministic and free of I/O: the same markup always yields the same
/// blocks, and nothing is retained between calls.
///
/// # Example
/// ```rust
/// use canvas2notion::{convert, BlockKind};
///
/// let blocks = convert("<h2>Notice</h2><p>Read <strong>carefully</strong>.</p>");
/// assert_eq!(blocks[0].kind, BlockKind::Heading2);
/// assert!(blocks[1].runs[1].annotations.bold);
/// ```
pub fn convert(markup: &str) -> Vec<Block> {
    convert_with(markup, &ConversionConfig::default()).blocks
}

/// Convert one markup fragment, applying `config` and collecting stats.
pub fn convert_with(markup: &str, config: &ConversionConfig) -> ConversionOutput {
    let start = Instant::now();
    let (blocks, mut stats) = tokenize::tokenize_and_assemble(markup, config.max_depth);
    let blocks = postprocess::apply(blocks, config, &mut stats);
    stats.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Converted {} bytes of markup into {} blocks ({} fallback)",
        markup.len(),
        stats.total_blocks,
        stats.fallback_blocks
    );

    ConversionOutput { blocks, stats }
}

/// Read an input (path, `-` for stdin, or HTTP/HTTPS URL) and convert it.
///
/// # Errors
/// Returns `Err(ConvertError)` when the input cannot be read or is not UTF-8.
/// The conversion itself never fails.
pub async fn convert_input(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    Ok(convert_with(&resolved.markup, config))
}

/// Convert an input and write the Notion `children` array to `output_path` as JSON.
///
/// Uses atomic write (temp file + rename) so readers never see a partial file.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let output = convert_input(input_str, config).await?;
    let children = notion::blocks_to_json(&output.blocks);
    let json = serde_json::to_string_pretty(&children)?;
    write_atomic(output_path.as_ref(), json.as_bytes()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert_input`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_input(input_str, config))
}

/// Write `bytes` to `path` via a temp file in the same directory, then rename.
///
/// Missing parent directories are created. Readers see either the old file
/// or the complete new one, never a partial write.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || persist_atomic(&path, &bytes))
        .await
        .map_err(|e| ConvertError::Internal(format!("Output write task failed: {}", e)))?
}

fn persist_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let write_err = |e| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
