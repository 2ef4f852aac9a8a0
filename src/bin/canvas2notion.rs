//! CLI binary for canvas2notion.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints or writes results.

use anyhow::{Context, Result};
use canvas2notion::output::FALLBACK_MESSAGE;
use canvas2notion::{
    convert_input, convert_stream, notion, write_atomic, Block, BlockKind, ConversionConfig,
    ConversionProgressCallback, ConversionStats, PageProperties, ProgressCallback,
};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents finish out of order, so start times are keyed by index.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        let started = match self.start_times.lock() {
            Ok(mut times) => times.remove(&index),
            Err(_) => None,
        };
        started
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, index: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(index, Instant::now());
        }
    }

    fn on_document_complete(&self, index: usize, total: usize, block_count: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{block_count:>5} blocks")),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);

        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} documents converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one page, Notion children JSON on stdout
  canvas2notion page.html

  # Internal block model with stats
  canvas2notion --format json page.html

  # Human-readable outline
  canvas2notion --format summary syllabus.html

  # Pipe from another tool
  curl -s https://canvas.example/api/v1/courses/1/pages/home | jq -r .body | canvas2notion -

  # Build the requests for a new Notion database page
  canvas2notion --database-id 0123abcd --title "Tutorial 9" --due 2024-03-01 \
      --module "Week 4" --type Assignment tutorial9.html -o request.json

  # Batch convert into a directory, 16 at a time
  canvas2notion -c 16 -o out/ pages/*.html

OUTPUT FORMATS:
  notion   Notion block children array (default)
  json     Blocks and conversion stats in the crate's own model
  summary  One line per block: kind and plain text

  With --database-id the output is {"create": <create-page body>, "append":
  [<append-children body>, ...]}: Notion accepts 100 children per request, so
  blocks past the first 100 go into the append bodies, in order.

ENVIRONMENT VARIABLES:
  RUST_LOG                  Override log filter (e.g. canvas2notion=debug)
  CANVAS2NOTION_DATABASE_ID Default --database-id
"#;

/// Convert Canvas LMS rich-text HTML into Notion blocks.
#[derive(Parser, Debug)]
#[command(
    name = "canvas2notion",
    version,
    about = "Convert Canvas LMS rich-text HTML into Notion blocks",
    long_about = "Convert Canvas LMS page, assignment and announcement bodies (local files, \
stdin, or URLs) into Notion block JSON. Unsupported markup becomes a single warning callout \
instead of being dropped silently.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local HTML file paths, HTTP/HTTPS URLs, or `-` for stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (one input) or directory (several inputs).
    #[arg(short, long, env = "CANVAS2NOTION_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, env = "CANVAS2NOTION_FORMAT", value_enum, default_value = "notion")]
    format: FormatArg,

    /// Collapse HTML whitespace runs inside text to one space.
    #[arg(long, env = "CANVAS2NOTION_COLLAPSE_WHITESPACE")]
    collapse_whitespace: bool,

    /// Drop paragraphs, headings and list items without visible text.
    #[arg(long, env = "CANVAS2NOTION_DROP_EMPTY")]
    drop_empty: bool,

    /// Maximum tag nesting depth tracked before content is treated as unsupported.
    #[arg(
        long,
        env = "CANVAS2NOTION_MAX_DEPTH",
        default_value_t = canvas2notion::DEFAULT_MAX_DEPTH
    )]
    max_depth: usize,

    /// Number of documents converted concurrently.
    #[arg(short, long, env = "CANVAS2NOTION_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Wrap output as a create-page request for this Notion database.
    #[arg(long, env = "CANVAS2NOTION_DATABASE_ID")]
    database_id: Option<String>,

    /// Page title for --database-id (default: input file stem).
    #[arg(long, requires = "database_id")]
    title: Option<String>,

    /// Due date for the page's `date` property (ISO 8601, e.g. Canvas `due_at`).
    #[arg(long, requires = "database_id")]
    due: Option<String>,

    /// Link back to the Canvas item for the page's `Website` property.
    #[arg(long, requires = "database_id")]
    url: Option<String>,

    /// Course module for the page's `module` select property.
    #[arg(long, requires = "database_id")]
    module: Option<String>,

    /// Item type for the page's `Type` multi-select property (repeatable).
    #[arg(long = "type", value_name = "TYPE", requires = "database_id")]
    types: Vec<String>,

    /// Disable progress bar.
    #[arg(long, env = "CANVAS2NOTION_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CANVAS2NOTION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CANVAS2NOTION_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CANVAS2NOTION_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Notion,
    Json,
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar only runs for batches; keep INFO logs out of its way.
    let batch = cli.inputs.len() > 1;
    let show_progress = batch && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if batch {
        run_batch(&cli, &config).await
    } else {
        run_single(&cli, &config).await
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_depth(cli.max_depth)
        .collapse_whitespace(cli.collapse_whitespace)
        .drop_empty_blocks(cli.drop_empty)
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_single(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    let input = &cli.inputs[0];
    let output = convert_input(input, config)
        .await
        .with_context(|| format!("Conversion failed for {input}"))?;

    let rendered = render(cli, input, &output.blocks, &output.stats)?.to_pretty()?;

    if let Some(ref path) = cli.output {
        write_output(path, &rendered).await?;
        if !cli.quiet {
            eprintln!(
                "{}  {} blocks  {}  {}ms  →  {}",
                if output.stats.fallback_blocks == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                output.stats.total_blocks,
                fallback_note(&output.stats),
                output.stats.duration_ms,
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet && output.stats.fallback_blocks > 0 {
            eprintln!("{} {}", yellow("⚠"), fallback_note(&output.stats));
        }
    }

    Ok(())
}

async fn run_batch(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if let Some(ref dir) = cli.output {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut results = convert_stream(cli.inputs.clone(), config);
    let mut failed = 0usize;
    let mut used_names: HashMap<String, usize> = HashMap::new();
    let mut finished = Vec::new();

    while let Some(doc) = results.next().await {
        finished.push(doc);
    }
    // Stable output naming regardless of completion order.
    finished.sort_by_key(|d| d.index);

    for doc in finished {
        if let Some(ref e) = doc.error {
            failed += 1;
            if !cli.quiet && config.progress_callback.is_none() {
                eprintln!("{} {}", red("✗"), e);
            }
            continue;
        }

        let rendered = render(cli, &doc.source, &doc.blocks, &doc.stats)?;
        match cli.output {
            Some(ref dir) => {
                let stem = output_stem(&doc.source);
                let name = unique_name(&mut used_names, &stem, rendered.extension());
                write_output(&dir.join(name), &rendered.to_pretty()?).await?;
            }
            None => match rendered {
                // One JSON document per line.
                Rendered::Json(value) => {
                    let line = json!({ "source": doc.source, "output": value });
                    println!("{}", serde_json::to_string(&line)?);
                }
                Rendered::Text(text) => {
                    println!("{}", bold(&format!("── {}", doc.source)));
                    println!("{text}");
                }
            },
        }
    }

    if failed == cli.inputs.len() {
        anyhow::bail!("All {failed} documents failed to convert");
    }
    Ok(())
}

/// A rendered document: JSON for the machine formats, plain text for summaries.
enum Rendered {
    Json(Value),
    Text(String),
}

impl Rendered {
    fn to_pretty(&self) -> Result<String> {
        match self {
            Rendered::Json(v) => {
                serde_json::to_string_pretty(v).context("Failed to serialise output")
            }
            Rendered::Text(t) => Ok(t.clone()),
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Rendered::Json(_) => "json",
            Rendered::Text(_) => "txt",
        }
    }
}

/// Render one document in the requested format.
fn render(cli: &Cli, source: &str, blocks: &[Block], stats: &ConversionStats) -> Result<Rendered> {
    if let Some(ref database_id) = cli.database_id {
        let properties = page_properties(cli, source);
        return Ok(Rendered::Json(notion::page_requests(
            database_id,
            &properties,
            blocks,
        )));
    }

    Ok(match cli.format {
        FormatArg::Notion => Rendered::Json(Value::Array(notion::blocks_to_json(blocks))),
        FormatArg::Json => Rendered::Json(json!({
            "source": source,
            "blocks": blocks,
            "stats": stats,
        })),
        FormatArg::Summary => Rendered::Text(summary(blocks)),
    })
}

/// Database properties from the page flags; the title defaults to the input's stem.
fn page_properties(cli: &Cli, source: &str) -> PageProperties {
    PageProperties {
        title: cli.title.clone().unwrap_or_else(|| output_stem(source)),
        due: cli.due.clone(),
        url: cli.url.clone(),
        module: cli.module.clone(),
        types: cli.types.clone(),
    }
}

/// One line per block: kind label and plain text.
fn summary(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| {
            let label = match b.kind {
                BlockKind::Paragraph => "¶ ",
                BlockKind::Heading1 => "H1",
                BlockKind::Heading2 => "H2",
                BlockKind::Heading3 => "H3",
                BlockKind::BulletedListItem => "• ",
                BlockKind::NumberedListItem => "1.",
                BlockKind::Divider => "──",
                BlockKind::CalloutWarning => "⚠️",
            };
            match b.kind {
                BlockKind::Divider => label.to_string(),
                BlockKind::CalloutWarning => format!("{label} {FALLBACK_MESSAGE}"),
                _ => format!("{label} {}", b.plain_text()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn fallback_note(stats: &ConversionStats) -> String {
    match stats.fallback_blocks {
        0 => dim("no unsupported content"),
        1 => yellow("1 unsupported region"),
        n => yellow(&format!("{n} unsupported regions")),
    }
}

/// File stem of a path or the last URL segment; `stdin` for `-`.
fn output_stem(source: &str) -> String {
    if source == "-" {
        return "stdin".to_string();
    }
    let trimmed = source.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = Path::new(last)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

fn unique_name(used: &mut HashMap<String, usize>, stem: &str, ext: &str) -> String {
    let count = used.entry(stem.to_string()).or_insert(0);
    *count += 1;
    if *count == 1 {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}-{count}.{ext}")
    }
}

async fn write_output(path: &Path, contents: &str) -> Result<()> {
    write_atomic(path, contents.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
