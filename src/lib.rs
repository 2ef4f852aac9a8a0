//! # canvas2notion
//!
//! Convert Canvas LMS rich-text HTML into Notion-style content blocks.
//!
//! ## Why this crate?
//!
//! Canvas pages, assignments and announcements store their bodies as free-form
//! HTML written by a rich-text editor. Notion wants a flat list of typed
//! blocks whose text is a sequence of styled runs. This crate reads the markup
//! as a token stream and drives a small state machine over it, so malformed
//! input (unclosed tags, stray end tags, absurd nesting) degrades gracefully
//! instead of failing: content the converter does not understand becomes a
//! single warning callout pointing back to the original page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML
//!  │
//!  ├─ 1. Input     read a local file, stdin, or download from URL
//!  ├─ 2. Tokenize  html5ever tokenizer, text events coalesced
//!  ├─ 3. Classify  tag name → block / inline / structural / unknown
//!  ├─ 4. Assemble  scope stack + state machine → blocks of text runs
//!  ├─ 5. Polish    opt-in whitespace collapsing, empty-block removal
//!  └─ 6. Output    blocks + stats, or Notion JSON via [`notion`]
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use canvas2notion::{convert, BlockKind};
//!
//! let blocks = convert("<ul><li>Week 1</li><li>Week 2</li></ul><hr>");
//! assert_eq!(blocks.len(), 3);
//! assert_eq!(blocks[0].kind, BlockKind::BulletedListItem);
//! assert_eq!(blocks[2].kind, BlockKind::Divider);
//! ```
//!
//! Reading files and writing Notion JSON:
//!
//! ```rust,no_run
//! use canvas2notion::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().collapse_whitespace(true).build()?;
//!     let output = convert_to_file("syllabus.html", "syllabus.json", &config).await?;
//!     eprintln!("{} blocks, {} fallback", output.stats.total_blocks, output.stats.fallback_blocks);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `canvas2notion` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! canvas2notion = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod notion;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MAX_DEPTH};
pub use convert::{
    convert, convert_input, convert_sync, convert_to_file, convert_with, write_atomic,
};
pub use error::{ConvertError, DocumentError};
pub use notion::PageProperties;
pub use output::{
    Annotation, Annotations, Block, BlockKind, ConversionOutput, ConversionStats, DocumentResult,
    TextRun,
};
pub use pipeline::assemble::{ConverterState, Event};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_batch, convert_stream, DocumentStream};
