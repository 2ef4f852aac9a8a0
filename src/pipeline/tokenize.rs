//! Driver loop: run html5ever's tokenizer and feed its events to the state machine.
//!
//! Only the tokenizer is used, not the tree builder, so the converter sees the
//! markup's tags exactly as written (no implied `<html>`/`<body>`, no
//! reparenting). Two adjustments keep the event stream faithful to the text:
//!
//! * The tokenizer may split one text node into several character tokens (at
//!   newlines and character references). They are coalesced so one text node
//!   yields one text event.
//! * Without a tree builder nobody switches the tokenizer into raw-text modes,
//!   so the sink does it for `script`/`style`-like tags; their bodies then
//!   arrive as text (dropped, since those tags are unsupported) rather than as
//!   bogus tags.

use super::assemble::{ConverterState, Event};
use crate::output::{Block, ConversionStats};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tracing::trace;

/// Tokenize `markup` and run it through a fresh [`ConverterState`].
pub fn tokenize_and_assemble(markup: &str, max_depth: usize) -> (Vec<Block>, ConversionStats) {
    let sink = BlockSink::new(max_depth);
    let mut tokenizer = Tokenizer::new(sink, TokenizerOpts::default());

    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    // The sink never requests script execution, so one feed drains the queue.
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    tokenizer.sink.finish()
}

/// Token sink owning the per-document converter state.
struct BlockSink {
    state: Option<ConverterState>,
    /// Character data not yet delivered as a text event.
    text: String,
}

impl BlockSink {
    fn new(max_depth: usize) -> Self {
        Self {
            state: Some(ConverterState::new(max_depth)),
            text: String::new(),
        }
    }

    fn apply(&mut self, event: Event<'_>) {
        if let Some(state) = self.state.take() {
            self.state = Some(state.feed(event));
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        self.apply(Event::Text(&text));
    }

    fn handle_tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        self.flush_text();
        let name: &str = &tag.name;
        match tag.kind {
            TagKind::StartTag => {
                let href = tag
                    .attrs
                    .iter()
                    .find(|attr| &*attr.name.local == "href")
                    .map(|attr| &*attr.value);
                self.apply(Event::Start {
                    name,
                    href,
                    self_closing: tag.self_closing,
                });
                match raw_kind(name) {
                    Some(kind) if !tag.self_closing => TokenSinkResult::RawData(kind),
                    _ => TokenSinkResult::Continue,
                }
            }
            TagKind::EndTag => {
                self.apply(Event::End { name });
                TokenSinkResult::Continue
            }
        }
    }

    fn finish(mut self) -> (Vec<Block>, ConversionStats) {
        self.flush_text();
        match self.state.take() {
            Some(state) => state.finish(),
            None => (Vec::new(), ConversionStats::default()),
        }
    }
}

impl TokenSink for BlockSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.handle_tag(tag),
            Token::CharacterTokens(chars) => self.text.push_str(&chars),
            Token::CommentToken(_) | Token::DoctypeToken(_) => self.flush_text(),
            Token::NullCharacterToken | Token::EOFToken => {}
            Token::ParseError(err) => trace!("tokenizer: {} (line {})", err, line_number),
        }
        TokenSinkResult::Continue
    }
}

/// Tags whose content the tokenizer must read as raw text.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "textarea" | "title" => Some(RawKind::Rcdata),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BlockKind;

    fn convert(markup: &str) -> Vec<Block> {
        tokenize_and_assemble(markup, 64).0
    }

    #[test]
    fn split_character_tokens_are_coalesced() {
        let blocks = convert("<p>line one\nline &amp; two</p>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].runs.len(), 1);
        assert_eq!(blocks[0].runs[0].content, "line one\nline & two");
    }

    #[test]
    fn entities_are_decoded() {
        let blocks = convert("<p>sheets:&nbsp;here</p>");
        assert_eq!(blocks[0].runs[0].content, "sheets:\u{a0}here");
    }

    #[test]
    fn comments_split_text_events() {
        let blocks = convert("<p>a<!-- note -->b</p>");
        let texts: Vec<_> = blocks[0].runs.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn script_body_is_not_tokenized_as_tags() {
        let blocks = convert("<script>if (a<b) { x('<p>no</p>') }</script><p>yes</p>");
        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BlockKind::CalloutWarning, BlockKind::Paragraph]);
        assert_eq!(blocks[1].plain_text(), "yes");
    }

    #[test]
    fn href_is_captured_from_attributes() {
        let blocks = convert(
            r#"<p><a class="instructure_file_link" title="t.pdf" href="https://canvas.example/files/1?wrap=1" target="_blank">Sheet</a></p>"#,
        );
        assert_eq!(
            blocks[0].runs[0].link.as_deref(),
            Some("https://canvas.example/files/1?wrap=1")
        );
    }

    #[test]
    fn uppercase_tags_are_normalised() {
        let blocks = convert("<P>Shout</P>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
    }
}
