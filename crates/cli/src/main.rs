use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use shelfmark_core::{ConfigFile, ContentProxy, ContentRecord, Entry, FetchConfig, HttpFetcher, RuleBasedTagger};
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{format_summary, print_banner, print_info, print_step, print_success, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the ingested entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(format!("Invalid format: {}. Valid options: json, text", s)),
        }
    }
}

/// Save an article: fetch it (or take supplied content), then print the stored entry
#[derive(Parser, Debug)]
#[command(name = "shelfmark")]
#[command(author = "Shelfmark Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Save articles into a read-it-later archive", long_about = None)]
struct Args {
    /// URL of the article
    #[arg(value_name = "URL")]
    url: String,

    /// HTML file to use as the article body instead of fetching
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// Title to use with the supplied content
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// JSON content record from an import (title, html, url, ...)
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Never fetch; only use supplied content
    #[arg(long)]
    no_fetch: bool,

    /// Configuration file (default: <config dir>/shelfmark/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Store the response headers on the entry
    #[arg(long)]
    store_headers: bool,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ConfigFile> {
    match path {
        Some(path) => {
            ConfigFile::load(path).with_context(|| format!("Failed to load config file: {}", path.display()))
        }
        None => match ConfigFile::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                ConfigFile::load(&path).with_context(|| format!("Failed to load config file: {}", path.display()))
            }
            None => Ok(ConfigFile::default()),
        },
    }
}

/// Content handed in on the command line, if any.
fn supplied_content(args: &Args) -> anyhow::Result<ContentRecord> {
    let mut record = match &args.import {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
            serde_json::from_str(&json).with_context(|| format!("Invalid content record: {}", path.display()))?
        }
        None => ContentRecord::default(),
    };

    if let Some(path) = &args.html {
        let html = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        record.html = html.into();
    }
    if let Some(title) = &args.title {
        record.title = Some(title.clone());
    }
    if (args.html.is_some() || args.title.is_some()) && record.url.is_empty() {
        record.url = args.url.clone();
    }

    Ok(record)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
        print_step(1, 3, "Loading configuration");
    }

    let config = load_config(args.config.as_ref())?;
    let mut proxy_config = config.proxy_config().context("Invalid [proxy] configuration")?;
    proxy_config.store_article_headers |= args.store_headers;

    let mut fetch_config = FetchConfig::from_section(&config.fetch);
    if let Some(timeout) = args.timeout {
        fetch_config.timeout = timeout;
    }
    if let Some(user_agent) = &args.user_agent {
        fetch_config.user_agent = user_agent.clone();
    }

    let content = supplied_content(&args)?;
    let fetcher = HttpFetcher::new(fetch_config).context("Failed to build HTTP client")?;
    let fetch_error_message = proxy_config.fetch_error_message.clone();
    let proxy = ContentProxy::new(fetcher)
        .with_config(proxy_config)
        .with_tagger(RuleBasedTagger::new(config.tagging_rules));

    let source = if args.no_fetch || content.is_usable() { "supplied content" } else { "the web" };
    tracing::debug!(url = %args.url, source, "ingesting entry");
    if args.verbose {
        print_step(2, 3, &format!("Ingesting {} from {}", args.url.bright_white().underline(), source));
    }

    let mut entry = Entry::new(args.url.as_str());
    proxy.update_entry(&mut entry, &args.url, content, args.no_fetch);
    if entry.title.as_deref().is_none_or(str::is_empty) {
        proxy.set_default_entry_title(&mut entry);
    }

    let failed = !fetch_error_message.is_empty()
        && entry.content.as_deref().is_some_and(|c| c.starts_with(&fetch_error_message));
    if failed {
        print_warning("Content could not be retrieved; the entry holds the fetch error message");
    }

    if args.verbose {
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&entry).context("Failed to serialize entry")?;
            json.push('\n');
            json
        }
        OutputFormat::Text => format_summary(&entry, args.output.is_none()),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
