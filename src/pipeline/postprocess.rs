//! Post-processing: optional cleanup passes over the assembled blocks.
//!
//! Both passes are off by default, so the converter's literal output is what
//! callers get unless they opt in through [`ConversionConfig`].
//!
//! 1. Collapse whitespace inside each run the way a browser renders it
//!    (pretty-printed Canvas markup is full of newlines and indentation).
//! 2. Drop text-bearing blocks left with no visible text.
//!
//! Whitespace collapsing runs first so a block of indentation-only runs counts
//! as empty for the second pass.

use crate::config::ConversionConfig;
use crate::output::{Block, ConversionStats};
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply the passes enabled in `config`, updating `stats` to match.
pub fn apply(
    mut blocks: Vec<Block>,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Vec<Block> {
    if config.collapse_whitespace {
        for block in &mut blocks {
            collapse_block_whitespace(block);
        }
    }
    if config.drop_empty_blocks {
        let before = blocks.len();
        blocks.retain(|b| !b.is_blank());
        stats.dropped_empty_blocks += before - blocks.len();
    }
    stats.total_blocks = blocks.len();
    blocks
}

// ── Pass 1: Collapse whitespace ─────────────────────────────────────────────

// HTML's ASCII whitespace only; U+00A0 from `&nbsp;` is deliberately kept.
static RE_HTML_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\n\r\x0C]+").unwrap());

/// Collapse whitespace runs to one space. Runs that were pure whitespace
/// stay as a single space so words on either side remain separated.
pub fn collapse_whitespace(input: &str) -> String {
    RE_HTML_WHITESPACE.replace_all(input, " ").into_owned()
}

fn collapse_block_whitespace(block: &mut Block) {
    for run in &mut block.runs {
        if RE_HTML_WHITESPACE.is_match(&run.content) {
            run.content = collapse_whitespace(&run.content);
        }
    }
    // Leading/trailing whitespace of a block is never rendered.
    if let Some(first) = block.runs.first_mut() {
        let trimmed = first.content.trim_start_matches(' ');
        if trimmed.len() != first.content.len() {
            first.content = trimmed.to_string();
        }
    }
    if let Some(last) = block.runs.last_mut() {
        let trimmed = last.content.trim_end_matches(' ');
        if trimmed.len() != last.content.len() {
            last.content = trimmed.to_string();
        }
    }
}
