//! Block assembly: the converter's state machine.
//!
//! [`ConverterState`] is one explicit value threaded through
//! [`ConverterState::step`], which consumes the state and one tokenizer
//! [`Event`] and returns the next state plus at most one emitted [`Block`].
//! Nothing here can fail: malformed structure either does nothing or produces
//! a fallback callout.
//!
//! ## States
//!
//! ```text
//!            BlockOpen                 owner's end tag
//!   Idle ─────────────────▶ Building ─────────────────▶ Idle (+ block)
//!     │                        │ BlockOpen (nested)
//!     │ top-level Unknown      └──▶ Building (+ interrupted block, if it has text)
//!     └──▶ Idle (+ callout)
//!   any state, <hr>  ──▶ same state (+ divider)
//!   Building, EOF    ──▶ Idle (+ force-flushed block)
//! ```
//!
//! A block is owned by the scope frame that opened it and is emitted when that
//! frame closes, whether by its own end tag or implicitly by an ancestor's.
//! When a nested block closes inside a still-open block frame, a continuation
//! block of the outer kind picks up trailing text; it is only emitted if it
//! receives any.

use super::classify::{classify, is_void, BlockOpen, Inline, TagRole};
use super::runs::RichText;
use super::scope::{Push, ScopeFrame, ScopeStack};
use crate::output::{Block, BlockKind, ConversionStats};
use tracing::{debug, trace, warn};

/// One tokenizer callback, flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    Start {
        name: &'a str,
        /// The `href` attribute, when present (only read for anchors).
        href: Option<&'a str>,
        self_closing: bool,
    },
    End {
        name: &'a str,
    },
    Text(&'a str),
    Eof,
}

/// Counts of block lifecycle transitions, for balance checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transitions {
    /// Blocks started (Idle→Building, or a nested block replacing the current one).
    pub opened: usize,
    /// Blocks ended by a closing tag or by a nested block opening.
    pub closed: usize,
    /// Blocks still open at end of input and flushed then.
    pub forced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingBlock {
    kind: BlockKind,
    text: RichText,
    /// Index of the scope frame whose closing ends this block.
    owner: usize,
    /// Started implicitly after a nested block closed.
    continuation: bool,
}

impl PendingBlock {
    /// Emit unless this is a continuation (or an interrupted block) that never
    /// got visible text. Whitespace alone does not count: pretty-printed markup
    /// puts indentation between every pair of tags.
    fn finish(self, keep_empty: bool) -> Option<Block> {
        if self.text.is_blank() && (self.continuation || !keep_empty) {
            return None;
        }
        Some(Block {
            kind: self.kind,
            runs: self.text.into_runs(),
        })
    }
}

/// Process-local state for converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterState {
    scopes: ScopeStack,
    current: Option<PendingBlock>,
    /// `href` of the most recently opened anchor, consumed when it closes.
    link: Option<String>,
    output: Vec<Block>,
    transitions: Transitions,
    stats: ConversionStats,
}

impl ConverterState {
    pub fn new(max_depth: usize) -> Self {
        Self {
            scopes: ScopeStack::new(max_depth),
            current: None,
            link: None,
            output: Vec::new(),
            transitions: Transitions::default(),
            stats: ConversionStats::default(),
        }
    }

    /// Apply one event. Returns the next state and the block it emitted, if any.
    ///
    /// The emitted block is *not* appended to the output; use [`feed`](Self::feed)
    /// for that.
    pub fn step(mut self, event: Event<'_>) -> (Self, Option<Block>) {
        trace!("event {:?} at depth {}", event, self.scopes.depth());
        let emitted = match event {
            Event::Start {
                name,
                href,
                self_closing,
            } => self.start_tag(name, href, self_closing),
            Event::End { name } => self.end_tag(name),
            Event::Text(text) => {
                self.text(text);
                None
            }
            Event::Eof => self.eof(),
        };
        (self, emitted)
    }

    /// Apply one event and append whatever it emitted to the output.
    pub fn feed(self, event: Event<'_>) -> Self {
        let (mut next, emitted) = self.step(event);
        if let Some(block) = emitted {
            next.record(&block);
            next.output.push(block);
        }
        next
    }

    /// Flush any open block and hand back the output sequence and stats.
    pub fn finish(self) -> (Vec<Block>, ConversionStats) {
        let mut done = self.feed(Event::Eof);
        done.stats.total_blocks = done.output.len();
        (done.output, done.stats)
    }

    /// Blocks emitted so far, in document order.
    pub fn output(&self) -> &[Block] {
        &self.output
    }

    pub fn transitions(&self) -> Transitions {
        self.transitions
    }

    pub fn is_building(&self) -> bool {
        self.current.is_some()
    }

    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    // ── Transitions ──────────────────────────────────────────────────────

    fn start_tag(&mut self, name: &str, href: Option<&str>, self_closing: bool) -> Option<Block> {
        let role = classify(name);

        if role == TagRole::BlockOpen(BlockOpen::Divider) {
            return Some(Block::divider());
        }

        let opens_scope = !self_closing && !is_void(name);

        // Inside unsupported content every tag is opaque.
        if self.scopes.in_opaque() {
            if opens_scope {
                self.push(ScopeFrame::new(name, TagRole::Unknown));
            }
            return None;
        }

        match role {
            TagRole::Unknown => {
                let emitted = self.fallback_unless_building(name);
                if opens_scope {
                    self.push(ScopeFrame::new(name, role));
                }
                emitted
            }
            TagRole::BlockOpen(open) => {
                if !opens_scope {
                    return None;
                }
                match self.push(ScopeFrame::new(name, role)) {
                    Push::Pushed(index) => {
                        let kind = open.resolve(self.scopes.list_below(index));
                        self.begin_block(kind, index, false)
                    }
                    Push::Overflow { first } => self.overflow(name, first),
                }
            }
            TagRole::InlineAnnotation(inline) => {
                if inline == Inline::Link {
                    self.link = href.map(str::to_string);
                }
                if opens_scope {
                    if let Push::Overflow { first } = self.push(ScopeFrame::new(name, role)) {
                        return self.overflow(name, first);
                    }
                }
                None
            }
            TagRole::StructuralIgnore(_) => {
                if opens_scope {
                    if let Push::Overflow { first } = self.push(ScopeFrame::new(name, role)) {
                        return self.overflow(name, first);
                    }
                }
                None
            }
        }
    }

    fn end_tag(&mut self, name: &str) -> Option<Block> {
        let Some(closed) = self.scopes.close(name) else {
            self.stats.unmatched_end_tags += 1;
            debug!("ignoring unmatched </{}>", name);
            return None;
        };
        self.stats.implicit_closes += closed.len().saturating_sub(1);

        let mut emitted = None;
        for (index, frame) in closed {
            match frame.role {
                TagRole::InlineAnnotation(Inline::Annotate(flag)) => {
                    if let Some(block) = self.current.as_mut() {
                        block.text.annotate_last(flag);
                    }
                }
                TagRole::InlineAnnotation(Inline::Link) => {
                    let url = self.link.take();
                    if let (Some(block), Some(url)) = (self.current.as_mut(), url) {
                        block.text.link_last(&url);
                    }
                }
                _ => {}
            }

            if self.current.as_ref().is_some_and(|b| b.owner == index) {
                if let Some(block) = self.current.take() {
                    self.transitions.closed += 1;
                    emitted = block.finish(true);
                }
            }
        }

        if emitted.is_some() || self.current.is_none() {
            self.resume_enclosing();
        }
        emitted
    }

    fn text(&mut self, text: &str) {
        match self.current.as_mut() {
            Some(block) if !self.scopes.in_opaque() => block.text.push_text(text),
            _ => self.stats.dropped_text_events += 1,
        }
    }

    fn eof(&mut self) -> Option<Block> {
        let block = self.current.take()?;
        self.transitions.forced += 1;
        debug!(
            "force-flushing unclosed {} block at end of input",
            block.kind.notion_type()
        );
        block.finish(true)
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn push(&mut self, frame: ScopeFrame) -> Push {
        let pushed = self.scopes.push(frame);
        if let Push::Overflow { .. } = pushed {
            self.stats.depth_overflows += 1;
        }
        self.stats.max_depth_seen = self.stats.max_depth_seen.max(self.scopes.depth());
        pushed
    }

    /// Start a block owned by the frame at `owner`, ending any current one.
    fn begin_block(&mut self, kind: BlockKind, owner: usize, continuation: bool) -> Option<Block> {
        let interrupted = self.current.take().and_then(|block| {
            self.transitions.closed += 1;
            debug!(
                "nested {} interrupts open {} block",
                kind.notion_type(),
                block.kind.notion_type()
            );
            block.finish(false)
        });
        self.transitions.opened += 1;
        self.current = Some(PendingBlock {
            kind,
            text: RichText::new(),
            owner,
            continuation,
        });
        interrupted
    }

    /// After a block closes, let the innermost still-open block frame collect trailing text.
    fn resume_enclosing(&mut self) {
        if self.current.is_some() || self.scopes.in_opaque() {
            return;
        }
        if let Some((index, open)) = self.scopes.enclosing_block() {
            let kind = open.resolve(self.scopes.list_below(index));
            self.begin_block(kind, index, true);
        }
    }

    fn fallback_unless_building(&mut self, name: &str) -> Option<Block> {
        if self.current.is_some() {
            debug!("dropping unsupported <{}> inside an open block", name);
            return None;
        }
        debug!("unsupported top-level <{}>: emitting fallback callout", name);
        Some(Block::fallback())
    }

    fn overflow(&mut self, name: &str, first: bool) -> Option<Block> {
        if !first {
            return None;
        }
        warn!(
            "scope depth cap reached at <{}>; treating nested content as unsupported",
            name
        );
        self.fallback_unless_building(name)
    }

    fn record(&mut self, block: &Block) {
        match block.kind {
            BlockKind::CalloutWarning => self.stats.fallback_blocks += 1,
            BlockKind::Divider => self.stats.divider_blocks += 1,
            _ => {}
        }
    }
}
