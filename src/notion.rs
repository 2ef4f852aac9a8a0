//! Notion wire format: serialise blocks into the JSON bodies the Notion API accepts.
//!
//! Nothing here talks to the network. Callers post the values produced here
//! with their own HTTP client and credentials.
//!
//! Notion imposes three size limits the serialiser enforces:
//!
//! * a rich-text span's `content` holds at most [`MAX_TEXT_CHARS`] characters,
//!   so longer runs are split into consecutive spans with identical styling;
//! * one block's `rich_text` array holds at most [`MAX_RICH_TEXT_SPANS`] spans,
//!   so [`blocks_to_json`] continues a longer block in a second block of the
//!   same kind;
//! * one request carries at most [`MAX_CHILDREN_PER_REQUEST`] child blocks,
//!   so [`children_batches`] chunks the block list and [`page_requests`] pairs
//!   the create-page body with the append requests for the rest.

use crate::output::{Block, BlockKind, TextRun, FALLBACK_ICON, FALLBACK_MESSAGE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Maximum characters in one rich-text span.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Maximum spans in one block's `rich_text` array.
pub const MAX_RICH_TEXT_SPANS: usize = 100;

/// Maximum child blocks in one create/append request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Database properties of a page created from a Canvas item.
///
/// Property names match the course database layout: `title`, `date`,
/// `Website`, `module` and `Type`. Unset fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProperties {
    pub title: String,
    /// Due date, ISO 8601 (`2024-03-01` or a full timestamp such as Canvas `due_at`).
    pub due: Option<String>,
    /// Link back to the Canvas item (`html_url`).
    pub url: Option<String>,
    /// Course module, stored as a select option.
    pub module: Option<String>,
    /// Item types (assignment, quiz, ...), stored as multi-select options.
    pub types: Vec<String>,
}

impl PageProperties {
    /// Properties carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// The `properties` object of a create-page request.
    pub fn to_json(&self) -> Value {
        let mut props = Map::new();
        props.insert(
            "title".into(),
            json!({ "title": [{ "type": "text", "text": { "content": self.title } }] }),
        );
        if let Some(ref due) = self.due {
            props.insert("date".into(), json!({ "type": "date", "date": { "start": due } }));
        }
        if let Some(ref url) = self.url {
            props.insert("Website".into(), json!({ "type": "url", "url": url }));
        }
        if let Some(ref module) = self.module {
            props.insert(
                "module".into(),
                json!({ "type": "select", "select": { "name": module } }),
            );
        }
        if !self.types.is_empty() {
            let options: Vec<Value> = self.types.iter().map(|t| json!({ "name": t })).collect();
            props.insert(
                "Type".into(),
                json!({ "type": "multi_select", "multi_select": options }),
            );
        }
        Value::Object(props)
    }
}

/// Serialise one block.
///
/// The whole `rich_text` array lands in this one value; use
/// [`blocks_to_json`] when a block may exceed [`MAX_RICH_TEXT_SPANS`].
pub fn block_to_json(block: &Block) -> Value {
    match block.kind {
        BlockKind::Divider => block_value(block.kind, json!({})),
        BlockKind::CalloutWarning => block_value(
            block.kind,
            json!({
                "rich_text": [text_span(FALLBACK_MESSAGE, &TextRun::plain(FALLBACK_MESSAGE))],
                "icon": { "type": "emoji", "emoji": FALLBACK_ICON },
                "color": "yellow_background",
            }),
        ),
        _ => block_value(block.kind, json!({ "rich_text": rich_text(&block.runs) })),
    }
}

/// Serialise blocks for a request, splitting any block whose rich text would
/// exceed [`MAX_RICH_TEXT_SPANS`] into consecutive blocks of the same kind.
pub fn blocks_to_json(blocks: &[Block]) -> Vec<Value> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        if !block.kind.is_text_bearing() {
            out.push(block_to_json(block));
            continue;
        }
        let spans = rich_text(&block.runs);
        if spans.len() <= MAX_RICH_TEXT_SPANS {
            out.push(block_value(block.kind, json!({ "rich_text": spans })));
            continue;
        }
        for chunk in spans.chunks(MAX_RICH_TEXT_SPANS) {
            out.push(block_value(block.kind, json!({ "rich_text": chunk })));
        }
    }
    out
}

fn block_value(kind: BlockKind, body: Value) -> Value {
    let ty = kind.notion_type();
    let mut value = json!({ "object": "block", "type": ty });
    value[ty] = body;
    value
}

/// Serialise runs as a Notion rich-text array, splitting over-long runs.
pub fn rich_text(runs: &[TextRun]) -> Vec<Value> {
    runs.iter()
        .flat_map(|run| {
            split_chars(&run.content, MAX_TEXT_CHARS)
                .into_iter()
                .map(move |chunk| text_span(chunk, run))
        })
        .collect()
}

fn text_span(content: &str, run: &TextRun) -> Value {
    let link = run.link.as_ref().map(|url| json!({ "url": url }));
    let a = &run.annotations;
    json!({
        "type": "text",
        "text": { "content": content, "link": link },
        "annotations": {
            "bold": a.bold,
            "italic": a.italic,
            "strikethrough": a.strikethrough,
            "underline": a.underline,
            "code": a.code,
            "color": "default",
        },
    })
}

/// Split `s` into pieces of at most `max` characters, on char boundaries.
fn split_chars(s: &str, max: usize) -> Vec<&str> {
    if s.chars().count() <= max {
        return vec![s];
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in s.char_indices() {
        if count == max {
            pieces.push(&s[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    pieces.push(&s[start..]);
    pieces
}

/// Serialise blocks in chunks of at most [`MAX_CHILDREN_PER_REQUEST`].
pub fn children_batches(blocks: &[Block]) -> Vec<Vec<Value>> {
    blocks_to_json(blocks)
        .chunks(MAX_CHILDREN_PER_REQUEST)
        .map(<[Value]>::to_vec)
        .collect()
}

/// Create-page body for a database entry.
///
/// Only the first batch of children fits in the create request; append the
/// remaining [`children_batches`] to the new page afterwards, or use
/// [`page_requests`] to get both at once.
pub fn page_payload(database_id: &str, properties: &PageProperties, blocks: &[Block]) -> Value {
    let children = children_batches(blocks).into_iter().next().unwrap_or_default();
    create_body(database_id, properties, children)
}

/// Every request needed to publish `blocks` as a new database page.
///
/// `create` is the create-page body with the first batch of children;
/// `append` holds the remaining batches, in order, for
/// `PATCH /v1/blocks/{page_id}/children` once the page exists.
pub fn page_requests(database_id: &str, properties: &PageProperties, blocks: &[Block]) -> Value {
    let mut batches = children_batches(blocks).into_iter();
    let first = batches.next().unwrap_or_default();
    let append: Vec<Value> = batches
        .map(|children| json!({ "children": children }))
        .collect();
    json!({
        "create": create_body(database_id, properties, first),
        "append": append,
    })
}

fn create_body(database_id: &str, properties: &PageProperties, children: Vec<Value>) -> Value {
    json!({
        "parent": { "type": "database_id", "database_id": database_id },
        "properties": properties.to_json(),
        "children": children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Annotation;

    fn bold_link_run() -> TextRun {
        let mut run = TextRun::plain("Sheet 1");
        run.annotations.insert(Annotation::Bold);
        run.link = Some("https://canvas.example/files/1".into());
        run
    }

    #[test]
    fn paragraph_shape() {
        let block = Block {
            kind: BlockKind::Paragraph,
            runs: vec![TextRun::plain("Read "), bold_link_run()],
        };
        let v = block_to_json(&block);
        assert_eq!(v["object"], "block");
        assert_eq!(v["type"], "paragraph");
        let spans = v["paragraph"]["rich_text"].as_array().unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0]["text"]["content"], "Read ");
        assert!(spans[0]["text"]["link"].is_null());
        assert_eq!(spans[1]["annotations"]["bold"], true);
        assert_eq!(spans[1]["annotations"]["italic"], false);
        assert_eq!(
            spans[1]["text"]["link"]["url"],
            "https://canvas.example/files/1"
        );
    }

    #[test]
    fn heading_and_list_types() {
        let v = block_to_json(&Block::new(BlockKind::Heading3));
        assert!(v["heading_3"]["rich_text"].as_array().unwrap().is_empty());
        let v = block_to_json(&Block::new(BlockKind::NumberedListItem));
        assert_eq!(v["type"], "numbered_list_item");
    }

    #[test]
    fn divider_and_callout() {
        let v = block_to_json(&Block::divider());
        assert_eq!(v, json!({ "object": "block", "type": "divider", "divider": {} }));

        let v = block_to_json(&Block::fallback());
        assert_eq!(v["type"], "callout");
        assert_eq!(v["callout"]["icon"]["emoji"], FALLBACK_ICON);
        assert_eq!(
            v["callout"]["rich_text"][0]["text"]["content"],
            FALLBACK_MESSAGE
        );
    }

    #[test]
    fn long_runs_are_split_with_same_style() {
        let mut run = bold_link_run();
        run.content = "é".repeat(MAX_TEXT_CHARS * 2 + 5);
        let spans = rich_text(&[run]);
        assert_eq!(spans.len(), 3);
        for span in &spans {
            assert_eq!(span["annotations"]["bold"], true);
            let n = span["text"]["content"].as_str().unwrap().chars().count();
            assert!(n <= MAX_TEXT_CHARS);
        }
        assert_eq!(
            spans[2]["text"]["content"].as_str().unwrap().chars().count(),
            5
        );
    }

    #[test]
    fn batches_respect_request_limit() {
        let blocks = vec![Block::divider(); MAX_CHILDREN_PER_REQUEST * 2 + 1];
        let batches = children_batches(&blocks);
        let sizes: Vec<_> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 1]);
    }

    #[test]
    fn page_payload_carries_first_batch() {
        let blocks = vec![Block::divider(); 150];
        let v = page_payload("db-123", &PageProperties::titled("Tutorial 9"), &blocks);
        assert_eq!(v["parent"]["database_id"], "db-123");
        assert_eq!(
            v["properties"]["title"]["title"][0]["text"]["content"],
            "Tutorial 9"
        );
        assert_eq!(v["children"].as_array().unwrap().len(), 100);
    }

    #[test]
    fn page_payload_without_blocks() {
        let v = page_payload("db", &PageProperties::titled("Empty"), &[]);
        assert!(v["children"].as_array().unwrap().is_empty());
        assert!(v["properties"].get("date").is_none());
    }

    #[test]
    fn page_requests_keep_every_block() {
        let mut blocks = vec![Block::divider(); 250];
        blocks.push(Block::fallback());
        let v = page_requests("db", &PageProperties::titled("Long"), &blocks);

        let create = v["create"]["children"].as_array().unwrap();
        assert_eq!(create.len(), 100);
        let append = v["append"].as_array().unwrap();
        let sizes: Vec<_> = append
            .iter()
            .map(|r| r["children"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![100, 51]);
        assert_eq!(append[1]["children"][50]["type"], "callout");
    }

    #[test]
    fn page_requests_without_overflow_has_no_appends() {
        let v = page_requests("db", &PageProperties::titled("Short"), &[Block::divider()]);
        assert!(v["append"].as_array().unwrap().is_empty());
    }

    #[test]
    fn full_page_properties() {
        let props = PageProperties {
            title: "Essay 2".into(),
            due: Some("2024-03-01T23:59:00Z".into()),
            url: Some("https://canvas.example/courses/7/assignments/3".into()),
            module: Some("Week 4".into()),
            types: vec!["Assignment".into(), "Writing".into()],
        };
        let v = page_payload("db", &props, &[]);
        let p = &v["properties"];
        assert_eq!(p["title"]["title"][0]["text"]["content"], "Essay 2");
        assert_eq!(p["date"]["date"]["start"], "2024-03-01T23:59:00Z");
        assert_eq!(
            p["Website"]["url"],
            "https://canvas.example/courses/7/assignments/3"
        );
        assert_eq!(p["module"]["select"]["name"], "Week 4");
        assert_eq!(p["Type"]["multi_select"][1]["name"], "Writing");
    }

    #[test]
    fn blocks_over_span_limit_continue_in_same_kind() {
        let block = Block {
            kind: BlockKind::BulletedListItem,
            runs: (0..MAX_RICH_TEXT_SPANS + 20)
                .map(|i| TextRun::plain(format!("r{i} ")))
                .collect(),
        };
        let values = blocks_to_json(&[Block::divider(), block]);
        assert_eq!(values.len(), 3);
        assert_eq!(values[1]["type"], "bulleted_list_item");
        assert_eq!(values[2]["type"], "bulleted_list_item");
        let first = values[1]["bulleted_list_item"]["rich_text"].as_array().unwrap();
        let second = values[2]["bulleted_list_item"]["rich_text"].as_array().unwrap();
        assert_eq!(first.len(), MAX_RICH_TEXT_SPANS);
        assert_eq!(second.len(), 20);
        assert_eq!(second[0]["text"]["content"], "r100 ");
    }

    #[test]
    fn split_runs_count_toward_span_limit() {
        let block = Block {
            kind: BlockKind::Paragraph,
            runs: vec![TextRun::plain("x".repeat(MAX_TEXT_CHARS * (MAX_RICH_TEXT_SPANS + 1)))],
        };
        let values = blocks_to_json(&[block]);
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["paragraph"]["rich_text"].as_array().unwrap().len(), 1);
    }
}
