//! Rich-text accumulation for the block under construction.
//!
//! Every text event becomes exactly one run. Inline tags annotate whatever run
//! is last when they close, so a text node wrapped in several inline tags ends
//! up with the union of their flags. A text node that is only partly covered
//! by an inline tag is still annotated as a whole; runs are never split.

use crate::output::{Annotation, TextRun};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    runs: Vec<TextRun>,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one run holding `content` verbatim.
    pub fn push_text(&mut self, content: &str) {
        self.runs.push(TextRun::plain(content));
    }

    /// Set `flag` on the most recent run. Returns false when there is none.
    pub fn annotate_last(&mut self, flag: Annotation) -> bool {
        match self.runs.last_mut() {
            Some(run) => {
                run.annotations.insert(flag);
                true
            }
            None => false,
        }
    }

    /// Attach `url` to the most recent run. Returns false when there is none.
    pub fn link_last(&mut self, url: &str) -> bool {
        match self.runs.last_mut() {
            Some(run) => {
                run.link = Some(url.to_string());
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// No runs, or only runs of whitespace (indentation between tags).
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.content.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn into_runs(self) -> Vec<TextRun> {
        self.runs
    }
}
