//! Scope stack: the currently open tags, innermost last.
//!
//! The stack answers three questions for the assembler: how deep are we,
//! which list container encloses a new `li`, and is any opaque (unknown)
//! scope open. Closing is forgiving: an end tag closes the nearest open frame
//! with its name plus everything opened above it, and an end tag with no
//! such frame does nothing.

use super::classify::{BlockOpen, ListKind, TagRole};

/// One open tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    pub name: String,
    pub role: TagRole,
    /// Set for `ul` / `ol`: the item kind implied for descendants.
    pub list: Option<ListKind>,
}

impl ScopeFrame {
    pub fn new(name: impl Into<String>, role: TagRole) -> Self {
        let list = match role {
            TagRole::StructuralIgnore(list) => list,
            _ => None,
        };
        Self {
            name: name.into(),
            role,
            list,
        }
    }

    fn is_unknown(&self) -> bool {
        self.role == TagRole::Unknown
    }
}

/// Bounded stack of open scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    max_depth: usize,
    /// Start tags refused at the cap whose end tags have not arrived yet.
    overflow: usize,
    unknown_open: usize,
}

/// Result of attempting to push a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// The frame was pushed at this index.
    Pushed(usize),
    /// The stack is full; the tag was counted as overflow.
    Overflow { first: bool },
}

impl ScopeStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth: max_depth.max(1),
            overflow: 0,
            unknown_open: 0,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.overflow == 0
    }

    /// Whether the region past the depth cap is currently open.
    pub fn in_overflow(&self) -> bool {
        self.overflow > 0
    }

    /// Whether any unknown scope (or the overflow region) is open.
    pub fn in_opaque(&self) -> bool {
        self.unknown_open > 0 || self.overflow > 0
    }

    pub fn push(&mut self, frame: ScopeFrame) -> Push {
        if self.overflow > 0 || self.frames.len() >= self.max_depth {
            self.overflow += 1;
            return Push::Overflow {
                first: self.overflow == 1,
            };
        }
        if frame.is_unknown() {
            self.unknown_open += 1;
        }
        self.frames.push(frame);
        Push::Pushed(self.frames.len() - 1)
    }

    /// Close the nearest frame named `name` and every frame above it.
    ///
    /// Returns the closed frames innermost first, paired with the index each
    /// occupied, or `None` when no frame matches. While in overflow the end
    /// tag is attributed to the overflow region and `Some(vec![])` is returned.
    pub fn close(&mut self, name: &str) -> Option<Vec<(usize, ScopeFrame)>> {
        if self.overflow > 0 {
            self.overflow -= 1;
            return Some(Vec::new());
        }
        let pos = self.frames.iter().rposition(|f| f.name == name)?;
        let mut closed = Vec::with_capacity(self.frames.len() - pos);
        while self.frames.len() > pos {
            let idx = self.frames.len() - 1;
            if let Some(frame) = self.frames.pop() {
                if frame.is_unknown() {
                    self.unknown_open -= 1;
                }
                closed.push((idx, frame));
            }
        }
        Some(closed)
    }

    /// List kind of the innermost enclosing list container.
    pub fn active_list(&self) -> Option<ListKind> {
        self.frames.iter().rev().find_map(|f| f.list)
    }

    /// Innermost still-open block-opening frame, with its index.
    pub fn enclosing_block(&self) -> Option<(usize, BlockOpen)> {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, f)| match f.role {
                TagRole::BlockOpen(open) => Some((i, open)),
                _ => None,
            })
    }

    /// List kind in effect for a frame at `index`, looking only below it.
    pub fn list_below(&self, index: usize) -> Option<ListKind> {
        self.frames[..index.min(self.frames.len())]
            .iter()
            .rev()
            .find_map(|f| f.list)
    }
}
