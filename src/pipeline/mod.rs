//! Pipeline stages for HTML-to-block conversion.
//!
//! Each submodule implements exactly one step, leaf-first:
//!
//! ```text
//! input ──▶ tokenize ──▶ classify ──▶ scope ──▶ runs / assemble ──▶ postprocess
//! (file/URL)  (html5ever)  (per tag)   (stack)   (state machine)     (optional)
//! ```
//!
//! 1. [`input`]   : read markup from a path, stdin, or URL (the only stage with I/O)
//! 2. [`tokenize`]: drive html5ever's tokenizer, coalescing text events
//! 3. [`classify`]: resolve each tag name to its role, once
//! 4. [`scope`]   : bounded stack of open tags; list context and opacity
//! 5. [`runs`]    : text runs of the block under construction
//! 6. [`assemble`]: the [`assemble::ConverterState`] state machine
//! 7. [`postprocess`]: opt-in whitespace collapsing and empty-block removal

pub mod assemble;
pub mod classify;
pub mod input;
pub mod postprocess;
pub mod runs;
pub mod scope;
pub mod tokenize;
