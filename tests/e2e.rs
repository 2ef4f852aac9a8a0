//! End-to-end integration tests for canvas2notion.
//!
//! Everything here goes through the public API only. No network access is
//! needed: inputs are literal markup or files written to a temp directory.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use canvas2notion::{
    convert, convert_batch, convert_input, convert_stream, convert_to_file, convert_with, notion,
    Block, BlockKind, ConversionConfig, ConverterState, DocumentError, Event, PageProperties,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A small but realistic Canvas assignment body, pretty-printed the way the
/// rich-text editor stores it.
const CANVAS_ASSIGNMENT: &str = r#"<p><strong>Due:</strong> Friday</p>
<h3>Readings</h3>
<ul>
  <li><a href="https://canvas.example/courses/7/files/12">Chapter 4</a></li>
  <li>Lecture notes</li>
</ul>
<table><tbody><tr><td>Grade</td><td>Weight</td></tr></tbody></table>
<p>Questions? <em>Ask on the forum.</em></p>"#;

fn write_html(dir: &Path, name: &str, markup: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, markup).unwrap();
    path
}

/// Route library logs to the test harness; `RUST_LOG=canvas2notion=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open(name: &str) -> Event<'_> {
    Event::Start {
        name,
        href: None,
        self_closing: false,
    }
}

fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
    blocks.iter().map(|b| b.kind).collect()
}

fn texts(blocks: &[Block]) -> Vec<String> {
    blocks.iter().map(Block::plain_text).collect()
}

// ── Converter behaviour ──────────────────────────────────────────────────────

#[test]
fn heading_then_paragraph_with_bold() {
    let blocks = convert("<h2>Notice</h2><p>Read <strong>carefully</strong>.</p>");
    assert_eq!(kinds(&blocks), vec![BlockKind::Heading2, BlockKind::Paragraph]);
    assert_eq!(blocks[0].plain_text(), "Notice");

    let runs = &blocks[1].runs;
    let contents: Vec<_> = runs.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["Read ", "carefully", "."]);
    assert!(!runs[0].annotations.bold);
    assert!(runs[1].annotations.bold);
    assert!(!runs[2].annotations.bold);
}

#[test]
fn unordered_list_gives_bulleted_items() {
    let blocks = convert("<ul><li>One</li><li>Two</li></ul>");
    assert_eq!(
        kinds(&blocks),
        vec![BlockKind::BulletedListItem, BlockKind::BulletedListItem]
    );
    assert_eq!(texts(&blocks), vec!["One", "Two"]);
}

#[test]
fn ordered_list_gives_numbered_items() {
    let blocks = convert("<ol><li>First</li><li>Second</li></ol>");
    assert_eq!(
        kinds(&blocks),
        vec![BlockKind::NumberedListItem, BlockKind::NumberedListItem]
    );
}

#[test]
fn unclosed_paragraph_is_flushed_at_end() {
    let blocks = convert("<p>Unclosed");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind, BlockKind::Paragraph);
    assert_eq!(blocks[0].plain_text(), "Unclosed");
}

#[test]
fn anchor_links_its_text() {
    let blocks = convert(r#"<p><a href="https://canvas.example/x">text</a></p>"#);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].runs.len(), 1);
    assert_eq!(blocks[0].runs[0].content, "text");
    assert_eq!(
        blocks[0].runs[0].link.as_deref(),
        Some("https://canvas.example/x")
    );
}

#[test]
fn bold_and_italic_merge_in_either_closing_order() {
    for markup in [
        "<p><strong><em>both</em></strong></p>",
        "<p><em><strong>both</strong></em></p>",
        "<p><strong><em>both</strong></em></p>",
        "<p><b><i>both</b></i></p>",
    ] {
        let blocks = convert(markup);
        assert_eq!(blocks.len(), 1, "{markup}");
        let run = &blocks[0].runs[0];
        assert!(run.annotations.bold, "{markup}");
        assert!(run.annotations.italic, "{markup}");
    }
}

#[test]
fn top_level_table_becomes_one_callout() {
    let blocks = convert("<p>before</p><table><tr><td>a</td><td>b</td></tr></table><p>after</p>");
    assert_eq!(
        kinds(&blocks),
        vec![
            BlockKind::Paragraph,
            BlockKind::CalloutWarning,
            BlockKind::Paragraph
        ]
    );
    assert_eq!(blocks[2].plain_text(), "after");
}

#[test]
fn horizontal_rule_is_a_bare_divider() {
    let blocks = convert("<p>a</p><hr><p>b</p>");
    assert_eq!(
        kinds(&blocks),
        vec![BlockKind::Paragraph, BlockKind::Divider, BlockKind::Paragraph]
    );
    assert!(blocks[1].runs.is_empty());
}

#[test]
fn entities_are_decoded() {
    let blocks = convert("<p>Q&amp;A &lt;today&gt;</p>");
    assert_eq!(blocks[0].plain_text(), "Q&A <today>");
}

#[test]
fn canvas_assignment_body() {
    let blocks = convert(CANVAS_ASSIGNMENT);
    assert_eq!(
        kinds(&blocks),
        vec![
            BlockKind::Paragraph,
            BlockKind::Heading3,
            BlockKind::BulletedListItem,
            BlockKind::BulletedListItem,
            BlockKind::CalloutWarning,
            BlockKind::Paragraph,
        ]
    );

    let due = &blocks[0].runs;
    assert_eq!(due[0].content, "Due:");
    assert!(due[0].annotations.bold);
    assert_eq!(due[1].content, " Friday");

    assert_eq!(
        blocks[2].runs[0].link.as_deref(),
        Some("https://canvas.example/courses/7/files/12")
    );
    assert!(blocks[5].runs[1].annotations.italic);
}

#[test]
fn pretty_printed_nested_lists_track_tags() {
    let markup = "<ul>\n  <li>One\n    <ul>\n      <li>Two</li>\n    </ul>\n  </li>\n</ul>";
    let blocks = convert(markup);
    assert_eq!(
        kinds(&blocks),
        vec![BlockKind::BulletedListItem, BlockKind::BulletedListItem]
    );
    assert_eq!(blocks[0].plain_text().trim(), "One");
    assert_eq!(blocks[1].plain_text(), "Two");
}

#[test]
fn pretty_printed_paragraph_in_list_item() {
    let blocks = convert("<ul>\n<li>\n<p>x</p>\n</li>\n</ul>");
    assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
    assert_eq!(blocks[0].plain_text(), "x");
}

#[test]
fn list_item_text_after_nested_paragraph_is_kept() {
    let blocks = convert("<ul>\n  <li>\n    <p>intro</p>\n    tail\n  </li>\n</ul>");
    assert_eq!(
        kinds(&blocks),
        vec![BlockKind::Paragraph, BlockKind::BulletedListItem]
    );
    assert_eq!(blocks[1].plain_text().trim(), "tail");
}

#[test]
fn conversion_is_deterministic() {
    let first = convert(CANVAS_ASSIGNMENT);
    for _ in 0..5 {
        assert_eq!(convert(CANVAS_ASSIGNMENT), first);
    }
}

#[test]
fn transitions_balance() {
    let events = [
        open("h1"),
        Event::Text("Title"),
        Event::End { name: "h1" },
        open("ul"),
        open("li"),
        Event::Text("item"),
        open("p"),
        Event::Text("dangling"),
    ];
    let state = events
        .iter()
        .fold(ConverterState::new(16), |state, ev| state.feed(*ev));
    let before_eof = state.transitions();
    assert!(state.is_building());

    let state = state.feed(Event::Eof);
    let t = state.transitions();
    assert_eq!(t.forced, 1);
    assert_eq!(t.opened, t.closed + t.forced);
    assert_eq!(before_eof.opened, t.opened);
    assert_eq!(texts(state.output()), vec!["Title", "item", "dangling"]);
}

#[test]
fn depth_cap_degrades_to_fallback() {
    let config = ConversionConfig::builder().max_depth(3).build().unwrap();
    let markup = "<div><div><div><div><p>deep</p></div></div></div></div><p>after</p>";
    let out = convert_with(markup, &config);

    assert_eq!(
        kinds(&out.blocks),
        vec![BlockKind::CalloutWarning, BlockKind::Paragraph]
    );
    assert_eq!(out.blocks[1].plain_text(), "after");
    assert!(out.stats.depth_overflows > 0);
    assert_eq!(out.stats.max_depth_seen, 3);
}

#[test]
fn collapse_and_drop_empty() {
    let config = ConversionConfig::builder()
        .collapse_whitespace(true)
        .drop_empty_blocks(true)
        .build()
        .unwrap();
    let out = convert_with("<p>\n   </p><p>\n  two\n  lines\n</p>", &config);
    assert_eq!(texts(&out.blocks), vec!["two lines"]);
    assert_eq!(out.stats.dropped_empty_blocks, 1);
}

// ── I/O entry points ─────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_to_file_writes_notion_children() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "assignment.html", CANVAS_ASSIGNMENT);
    let output = dir.path().join("out/assignment.json");

    let result = convert_to_file(
        input.to_string_lossy(),
        &output,
        &ConversionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(result.stats.total_blocks, 6);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let children = written.as_array().unwrap();
    assert_eq!(children.len(), 6);
    assert_eq!(children[1]["type"], "heading_3");
    assert_eq!(children[4]["type"], "callout");
    assert_eq!(
        children[2]["bulleted_list_item"]["rich_text"][0]["text"]["link"]["url"],
        "https://canvas.example/courses/7/files/12"
    );
}

#[test]
fn convert_input_from_sync_context() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_html(dir.path(), "page.html", "<h1>Week 1</h1>");
    let out = tokio_test::block_on(convert_input(
        input.to_string_lossy(),
        &ConversionConfig::default(),
    ))
    .unwrap();
    assert_eq!(out.blocks[0].kind, BlockKind::Heading1);
}

#[tokio::test]
async fn stream_reports_failures_per_document() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let a = write_html(dir.path(), "a.html", "<p>a</p>");
    let b = write_html(dir.path(), "b.html", "<ul><li>x</li><li>y</li></ul>");
    let inputs = vec![
        a.to_string_lossy().to_string(),
        dir.path().join("missing.html").to_string_lossy().to_string(),
        b.to_string_lossy().to_string(),
    ];

    let config = ConversionConfig::builder().concurrency(3).build().unwrap();
    let mut seen: Vec<_> = convert_stream(inputs.clone(), &config).collect().await;
    seen.sort_by_key(|d| d.index);

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].blocks.len(), 1);
    assert!(matches!(
        seen[1].error,
        Some(DocumentError::ReadFailed { index: 1, .. })
    ));
    assert_eq!(seen[2].blocks.len(), 2);

    let batch = convert_batch(inputs, &config).await;
    let indices: Vec<_> = batch.iter().map(|d| d.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn page_payload_wraps_converted_blocks() {
    let blocks = convert(CANVAS_ASSIGNMENT);
    let properties = PageProperties {
        due: Some("2024-03-01T23:59:00Z".into()),
        url: Some("https://canvas.example/courses/7/assignments/3".into()),
        ..PageProperties::titled("Assignment 3")
    };
    let payload = notion::page_payload("db-42", &properties, &blocks);
    assert_eq!(payload["parent"]["database_id"], "db-42");
    assert_eq!(
        payload["properties"]["title"]["title"][0]["text"]["content"],
        "Assignment 3"
    );
    assert_eq!(
        payload["properties"]["date"]["date"]["start"],
        "2024-03-01T23:59:00Z"
    );
    assert_eq!(payload["children"].as_array().unwrap().len(), blocks.len());
}

#[test]
fn long_documents_split_into_create_and_append_requests() {
    let markup: String = (0..130).map(|i| format!("<li>item {i}</li>")).collect();
    let blocks = convert(&format!("<ol>{markup}</ol>"));
    assert_eq!(blocks.len(), 130);

    let requests = notion::page_requests("db", &PageProperties::titled("Long"), &blocks);
    let created = requests["create"]["children"].as_array().unwrap();
    let appended = requests["append"][0]["children"].as_array().unwrap();
    assert_eq!(created.len() + appended.len(), 130);
    assert_eq!(
        appended[29]["numbered_list_item"]["rich_text"][0]["text"]["content"],
        "item 129"
    );
}
