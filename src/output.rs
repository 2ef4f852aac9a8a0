//! Output types: the blocks a conversion produces and its statistics.
//!
//! A [`Block`] is one unit of destination content. Text-bearing kinds carry an
//! ordered list of [`TextRun`]s; dividers and fallback callouts carry none
//! (the callout's message is fixed and derived from its kind).

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// Literal message carried by every fallback callout.
pub const FALLBACK_MESSAGE: &str =
    "Some content could not be converted. Check the original Canvas page for the full version.";

/// Emoji icon attached to fallback callouts.
pub const FALLBACK_ICON: &str = "⚠️";

/// Closed set of block kinds. Serialised names match the Notion block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading_1")]
    Heading1,
    #[serde(rename = "heading_2")]
    Heading2,
    #[serde(rename = "heading_3")]
    Heading3,
    #[serde(rename = "bulleted_list_item")]
    BulletedListItem,
    #[serde(rename = "numbered_list_item")]
    NumberedListItem,
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "callout")]
    CalloutWarning,
}

impl BlockKind {
    /// Notion block `type` string for this kind.
    pub fn notion_type(self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading1 => "heading_1",
            BlockKind::Heading2 => "heading_2",
            BlockKind::Heading3 => "heading_3",
            BlockKind::BulletedListItem => "bulleted_list_item",
            BlockKind::NumberedListItem => "numbered_list_item",
            BlockKind::Divider => "divider",
            BlockKind::CalloutWarning => "callout",
        }
    }

    /// Whether blocks of this kind accumulate text runs.
    pub fn is_text_bearing(self) -> bool {
        !matches!(self, BlockKind::Divider | BlockKind::CalloutWarning)
    }
}

/// Per-run formatting flags. Flags only ever get set, never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
}

/// A single formatting flag applied by an inline tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Annotation {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl Annotations {
    /// Add `flag` to the set, keeping every flag already present.
    pub fn insert(&mut self, flag: Annotation) {
        match flag {
            Annotation::Bold => self.bold = true,
            Annotation::Italic => self.italic = true,
            Annotation::Underline => self.underline = true,
            Annotation::Strikethrough => self.strikethrough = true,
            Annotation::Code => self.code = true,
        }
    }

    pub fn contains(&self, flag: Annotation) -> bool {
        match flag {
            Annotation::Bold => self.bold,
            Annotation::Italic => self.italic,
            Annotation::Underline => self.underline,
            Annotation::Strikethrough => self.strikethrough,
            Annotation::Code => self.code,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Annotations::default()
    }
}

/// A contiguous span of text: the payload of exactly one text event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub content: String,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }
}

/// One emitted unit of destination content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TextRun>,
}

impl Block {
    /// An empty block of `kind`, ready to accumulate runs.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            runs: Vec::new(),
        }
    }

    pub fn divider() -> Self {
        Self::new(BlockKind::Divider)
    }

    /// The placeholder emitted in place of untranslatable content.
    pub fn fallback() -> Self {
        Self::new(BlockKind::CalloutWarning)
    }

    /// Concatenated run contents (the callout message for fallback blocks).
    pub fn plain_text(&self) -> String {
        match self.kind {
            BlockKind::CalloutWarning => FALLBACK_MESSAGE.to_string(),
            _ => self.runs.iter().map(|r| r.content.as_str()).collect(),
        }
    }

    /// A text-bearing block whose runs hold nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.kind.is_text_bearing() && self.runs.iter().all(|r| r.content.trim().is_empty())
    }
}

/// Counters collected while converting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Blocks in the final output.
    pub total_blocks: usize,
    /// Callout blocks emitted for unsupported content.
    pub fallback_blocks: usize,
    pub divider_blocks: usize,
    /// Text events discarded because no block was open (or inside opaque content).
    pub dropped_text_events: usize,
    /// End tags that matched no open scope.
    pub unmatched_end_tags: usize,
    /// Frames closed because an ancestor's end tag arrived first.
    pub implicit_closes: usize,
    /// Deepest scope stack observed.
    pub max_depth_seen: usize,
    /// Start tags refused because the scope stack was full.
    pub depth_overflows: usize,
    /// Blocks removed by `drop_empty_blocks`.
    pub dropped_empty_blocks: usize,
    pub duration_ms: u64,
}

/// Blocks plus stats for a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub blocks: Vec<Block>,
    pub stats: ConversionStats,
}

/// Outcome of one document in a batch conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// 0-based position of the document in the batch input.
    pub index: usize,
    /// The path, URL, or `-` the document was read from.
    pub source: String,
    pub blocks: Vec<Block>,
    pub stats: ConversionStats,
    /// Set when the document could not be read; `blocks` is then empty.
    pub error: Option<DocumentError>,
}
