mod echo;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use gleaner_core::{
    DocumentRecord, GleanerConfig, GleanerError, MarkdownConfig, OutputFormat, PageStyle, PagedConfig, Retriever,
    convert_to_markdown, convert_to_pages, extract_html, fetch_file, fetch_stdin, render, validate_url,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::echo::*;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL for input that has no address of its own.
const DETACHED_BASE: &str = "about:blank";

/// First-page layout for the `pages` format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PageStyleArg {
    Standard,
    Enhanced,
}

impl From<PageStyleArg> for PageStyle {
    fn from(arg: PageStyleArg) -> Self {
        match arg {
            PageStyleArg::Standard => PageStyle::Standard,
            PageStyleArg::Enhanced => PageStyle::Enhanced,
        }
    }
}

/// Retrieve web pages, extract their main content, and convert it
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(author = "Gleaner Contributors")]
#[command(version)]
#[command(about = "Retrieve web pages and extract their main content", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (markdown, html, text, pages, word, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// URL that relative links resolve against for file or stdin input
    #[arg(long, value_name = "URL")]
    source_url: Option<String>,

    /// Per-strategy timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for direct requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Leave images out of the extracted record
    #[arg(long)]
    no_images: bool,

    /// Include reference table with all links (Markdown only)
    #[arg(long)]
    references: bool,

    /// First-page layout (pages only)
    #[arg(long, value_enum, default_value = "standard", value_name = "STYLE")]
    page_style: PageStyleArg,

    /// Print word count, character count and reading time
    #[arg(long)]
    stats: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gleaner_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Base URL for markup read from a file or stdin.
fn detached_base(source_url: Option<&str>, path: Option<&Path>) -> anyhow::Result<Url> {
    if let Some(source_url) = source_url {
        return validate_url(source_url).context("Invalid --source-url");
    }

    let from_path = path.and_then(|p| fs::canonicalize(p).ok()).and_then(|p| Url::from_file_path(p).ok());
    match from_path {
        Some(url) => Ok(url),
        None => Url::parse(DETACHED_BASE).context("Failed to build base URL"),
    }
}

fn render_output(record: &DocumentRecord, args: &Args) -> gleaner_core::Result<String> {
    match args.format {
        OutputFormat::Markdown => {
            let config = MarkdownConfig {
                include_references: args.references,
                strip_images: args.no_images,
                ..Default::default()
            };
            convert_to_markdown(record, &config)
        }
        OutputFormat::PaginatedDocument => {
            convert_to_pages(record, &PagedConfig { style: args.page_style.into(), ..Default::default() })
        }
        format => render(record, format),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let started = Instant::now();
    let mut timings: Vec<(&str, Duration)> = Vec::new();

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let mut builder = GleanerConfig::builder().timeout(args.timeout).include_images(!args.no_images);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    let config = builder.build();
    tracing::debug!(input = %args.input, format = %args.format, "starting");

    let step = Instant::now();
    let record = if is_url(&args.input) {
        let url = validate_url(&args.input).context("Invalid URL")?;
        if args.verbose {
            print_step(1, 3, &format!("Retrieving {}", url.as_str().bright_white().underline()));
        }

        let retriever = Retriever::new(config).context("Failed to build HTTP client")?;
        let (record, attempts) = retriever.retrieve_with_attempts(&url).await;
        timings.push(("Retrieve", step.elapsed()));

        if args.verbose {
            print_attempts(&attempts);
        }
        if record.is_synthetic() {
            print_warning("Every retrieval strategy failed; the output is simulated content");
        }
        record
    } else {
        let (html, base) = if args.input == "-" {
            if args.verbose {
                print_step(1, 3, "Reading from stdin");
            }
            let html = fetch_stdin().context("Failed to read from stdin")?;
            (html, detached_base(args.source_url.as_deref(), None)?)
        } else {
            if args.verbose {
                print_step(1, 3, &format!("Reading from file {}", args.input.bright_white()));
            }
            let html = fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?;
            (html, detached_base(args.source_url.as_deref(), Some(Path::new(&args.input)))?)
        };

        if args.verbose {
            eprintln!("  {} {}\n", "Size:".dimmed(), format_size(html.len()).bright_white());
        }

        let record = extract_html(&html, &base, &config);
        timings.push(("Extract", step.elapsed()));

        if record.is_blank() {
            return Err(GleanerError::NoContent).with_context(|| format!("Nothing to extract from {}", args.input));
        }
        record
    };

    if args.verbose {
        print_step(2, 3, "Extracted record");
        print_record_details(&record);
        print_step(3, 3, &format!("Rendering {}", args.format));
    }

    let step = Instant::now();
    let output = render_output(&record, &args).with_context(|| format!("Failed to render {}", args.format))?;
    timings.push(("Render", step.elapsed()));

    if args.stats {
        print_stats(&record.stats());
    }

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    if args.verbose {
        print_timing_summary(started.elapsed(), &timings);
    }

    Ok(())
}
