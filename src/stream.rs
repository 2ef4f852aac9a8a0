//! Batch conversion: convert many documents concurrently, emitting each as it finishes.
//!
//! Every document gets its own converter state, so documents share nothing
//! and need no locking. Reading runs on the async runtime; the conversion
//! itself is CPU-bound and runs in `spawn_blocking`. Results arrive in
//! completion order; sort by [`DocumentResult::index`] if order matters.

use crate::config::ConversionConfig;
use crate::convert::convert_with;
use crate::error::DocumentError;
use crate::output::{ConversionStats, DocumentResult};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Convert every input, `config.concurrency` at a time.
///
/// Failures to read one document are reported in that document's
/// [`DocumentResult::error`] and never stop the batch. The progress callback,
/// if configured, receives per-document events and a final
/// `on_batch_complete` once the stream is exhausted.
///
/// # Example
/// ```rust,no_run
/// use canvas2notion::{convert_stream, ConversionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let inputs = vec!["week1.html".to_string(), "week2.html".to_string()];
/// let mut results = convert_stream(inputs, &ConversionConfig::default());
/// while let Some(doc) = results.next().await {
///     match doc.error {
///         None => println!("{}: {} blocks", doc.source, doc.blocks.len()),
///         Some(e) => eprintln!("{e}"),
///     }
/// }
/// # }
/// ```
pub fn convert_stream(inputs: Vec<String>, config: &ConversionConfig) -> DocumentStream {
    let total = inputs.len();
    info!("Starting batch conversion of {} documents", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let concurrency = config.concurrency.max(1);
    let successes = Arc::new(AtomicUsize::new(0));
    let config_clone = config.clone();

    let counter = Arc::clone(&successes);
    let results = stream::iter(inputs.into_iter().enumerate().map(move |(index, source)| {
        let cfg = config_clone.clone();
        let counter = Arc::clone(&counter);
        async move {
            let result = convert_one(index, total, source, cfg).await;
            if result.error.is_none() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            result
        }
    }))
    .buffer_unordered(concurrency);

    // Fire on_batch_complete after the last document.
    let finish_cb = config.progress_callback.clone();
    let tail = stream::once(async move {
        if let Some(cb) = finish_cb {
            cb.on_batch_complete(total, successes.load(Ordering::SeqCst));
        }
    })
    .filter_map(|_| async { None::<DocumentResult> });

    Box::pin(results.chain(tail))
}

/// Convert a batch and collect every result, sorted by input position.
pub async fn convert_batch(inputs: Vec<String>, config: &ConversionConfig) -> Vec<DocumentResult> {
    let mut results: Vec<DocumentResult> = convert_stream(inputs, config).collect().await;
    results.sort_by_key(|r| r.index);
    results
}

async fn convert_one(
    index: usize,
    total: usize,
    source: String,
    config: ConversionConfig,
) -> DocumentResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(index, total);
    }

    let failed = |error: DocumentError, source: String| {
        warn!("{}", error);
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_error(index, total, &error.to_string());
        }
        DocumentResult {
            index,
            source,
            blocks: Vec::new(),
            stats: ConversionStats::default(),
            error: Some(error),
        }
    };

    let resolved = match input::resolve_input(&source, config.download_timeout_secs).await {
        Ok(r) => r,
        Err(e) => {
            let error = DocumentError::from_convert(index, &source, &e);
            return failed(error, source);
        }
    };

    let cfg = config.clone();
    let task = tokio::task::spawn_blocking(move || convert_with(&resolved.markup, &cfg));
    let output = match task.await {
        Ok(output) => output,
        Err(e) => {
            let error = DocumentError::TaskFailed {
                index,
                source_name: source.clone(),
                detail: e.to_string(),
            };
            return failed(error, source);
        }
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(index, total, output.blocks.len());
    }

    DocumentResult {
        index,
        source,
        blocks: output.blocks,
        stats: output.stats,
        error: None,
    }
}
