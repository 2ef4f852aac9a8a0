//! Tag classification: resolve a raw tag name to its role, once per tag.
//!
//! Supporting a new tag is one match arm in [`classify`]. Anything not listed
//! is [`TagRole::Unknown`], which is an expected outcome and routes the tag to
//! the fallback path rather than failing.

use crate::output::{Annotation, BlockKind};

/// Which list-item kind a list container implies for its `li` children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn item_kind(self) -> BlockKind {
        match self {
            ListKind::Bulleted => BlockKind::BulletedListItem,
            ListKind::Numbered => BlockKind::NumberedListItem,
        }
    }
}

/// Block kind requested by a block-opening tag.
///
/// `li` cannot name its kind alone: it depends on the enclosing list
/// container and is resolved against the scope stack when the tag opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOpen {
    Paragraph,
    Heading(u8),
    ListItem,
    Divider,
}

impl BlockOpen {
    /// Concrete kind, given the innermost list container (if any).
    pub fn resolve(self, list: Option<ListKind>) -> BlockKind {
        match self {
            BlockOpen::Paragraph => BlockKind::Paragraph,
            BlockOpen::Heading(1) => BlockKind::Heading1,
            BlockOpen::Heading(2) => BlockKind::Heading2,
            BlockOpen::Heading(_) => BlockKind::Heading3,
            BlockOpen::ListItem => list.unwrap_or(ListKind::Bulleted).item_kind(),
            BlockOpen::Divider => BlockKind::Divider,
        }
    }
}

/// Inline tags modify the last run of the current block when they close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    Annotate(Annotation),
    Link,
}

/// Semantic role of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRole {
    BlockOpen(BlockOpen),
    InlineAnnotation(Inline),
    /// Layout wrapper with no content of its own; list containers carry the
    /// list kind their items inherit.
    StructuralIgnore(Option<ListKind>),
    Unknown,
}

/// Classify a tag name. Matching is ASCII case-insensitive.
pub fn classify(tag: &str) -> TagRole {
    let lower;
    let tag = if tag.bytes().any(|b| b.is_ascii_uppercase()) {
        lower = tag.to_ascii_lowercase();
        lower.as_str()
    } else {
        tag
    };

    match tag {
        "p" => TagRole::BlockOpen(BlockOpen::Paragraph),
        "h1" => TagRole::BlockOpen(BlockOpen::Heading(1)),
        "h2" => TagRole::BlockOpen(BlockOpen::Heading(2)),
        "h3" => TagRole::BlockOpen(BlockOpen::Heading(3)),
        "li" => TagRole::BlockOpen(BlockOpen::ListItem),
        "hr" => TagRole::BlockOpen(BlockOpen::Divider),

        "strong" | "b" => TagRole::InlineAnnotation(Inline::Annotate(Annotation::Bold)),
        "em" | "i" => TagRole::InlineAnnotation(Inline::Annotate(Annotation::Italic)),
        "u" => TagRole::InlineAnnotation(Inline::Annotate(Annotation::Underline)),
        "s" | "strike" | "del" => {
            TagRole::InlineAnnotation(Inline::Annotate(Annotation::Strikethrough))
        }
        "code" => TagRole::InlineAnnotation(Inline::Annotate(Annotation::Code)),
        "a" => TagRole::InlineAnnotation(Inline::Link),

        "ul" => TagRole::StructuralIgnore(Some(ListKind::Bulleted)),
        "ol" => TagRole::StructuralIgnore(Some(ListKind::Numbered)),
        "div" | "span" | "br" => TagRole::StructuralIgnore(None),

        _ => TagRole::Unknown,
    }
}

/// HTML void elements never receive an end tag, so they never open a scope.
pub fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
