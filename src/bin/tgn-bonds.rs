//! CLI binary for tgn-bonds.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ScrapeConfig` / `ExtractConfig` and prints results.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tgn_bonds::config::{DEFAULT_DOCUMENT_BASE, DEFAULT_LISTING_URL, DEFAULT_OUTPUT_PATH, DEFAULT_PDF_DIR};
use tgn_bonds::pipeline::sink;
use tgn_bonds::{
    discover, extract, scrape, DateRange, ExtractConfig, ExtractionOutput,
    ExtractionProgressCallback, ProgressCallback, ScrapeConfig, ScrapeStats,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal progress callback: one bar for the run plus a log line per
/// document. Documents finish out of order when concurrency > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, document: &str) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(document)
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_documents} result documents…"))
        ));
    }

    fn on_document_start(&self, document: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(document.to_string(), Instant::now());
        self.bar.set_message(document.to_string());
    }

    fn on_document_complete(&self, document: &str, records: usize) {
        let secs = self.elapsed_secs(document);
        self.bar.println(format!(
            "  {} {:<22}  {:<10}  {}",
            green("✓"),
            document,
            dim(&format!("{records:>2} terms")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, document: &str, error: &str) {
        let secs = self.elapsed_secs(document);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<22}  {}  {}",
            red("✗"),
            document,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_documents: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {} documents parsed",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents parsed  ({} skipped)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download new result documents and rebuild the CSV
  tgn-bonds run

  # Only download, for auctions in 2024
  tgn-bonds scrape --from 2024-01-01 --to 2024-12-31

  # Show what would be downloaded
  tgn-bonds scrape --dry-run

  # Re-parse documents already on disk
  tgn-bonds --dir data/pdfs/tgn_bonos extract -o data/bonos_tgn_auctions.csv

  # Records as JSON on stdout
  tgn-bonds extract --json > auctions.json

OUTPUT COLUMNS:
  filename             source document name
  date                 auction date from BT_YYYY_MM_DD.pdf (empty if unknown)
  plazo_dias           term in days (empty if the heading had no number)
  cantidad_demandada   amount demanded
  cantidad_adjudicada  amount awarded
  tre                  reference rate
  motivo_rechazo       DPM, DPF or empty

ENVIRONMENT VARIABLES:
  TGN_LISTING_URL       Listing page to scan
  TGN_DOCUMENT_BASE     Prefix for relative document links
  TGN_PDF_DIR           Directory holding BT_*.pdf files
  TGN_OUTPUT            CSV output path
  PDFIUM_LIB_PATH       Directory containing libpdfium (default: system library)
  RUST_LOG              Overrides the log filter (e.g. tgn_bonds=debug)
"#;

/// Scrape BCB BONOS TGN auction results and extract them to CSV.
#[derive(Parser, Debug)]
#[command(
    name = "tgn-bonds",
    version,
    about = "Scrape BCB BONOS TGN auction result PDFs and extract per-term records to CSV",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TGN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TGN_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "TGN_NO_PROGRESS")]
    no_progress: bool,

    /// Directory holding BT_YYYY_MM_DD.pdf files.
    #[arg(long = "dir", global = true, env = "TGN_PDF_DIR", default_value = DEFAULT_PDF_DIR)]
    pdf_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download result documents listed on the BCB site.
    Scrape(ScrapeArgs),
    /// Parse downloaded documents into the CSV table.
    Extract(ExtractArgs),
    /// Scrape, then extract.
    Run {
        #[command(flatten)]
        scrape: ScrapeArgs,
        #[command(flatten)]
        extract: ExtractArgs,
    },
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// First auction date to download (YYYY-MM-DD). Default: 2023-01-01.
    #[arg(long, env = "TGN_FROM", value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Last auction date to download (YYYY-MM-DD). Default: today.
    #[arg(long, env = "TGN_TO", value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// Listing page to scan.
    #[arg(long, env = "TGN_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Prefix for relative document links.
    #[arg(long, env = "TGN_DOCUMENT_BASE", default_value = DEFAULT_DOCUMENT_BASE)]
    document_base: String,

    /// Re-download documents that already exist.
    #[arg(long, env = "TGN_OVERWRITE")]
    overwrite: bool,

    /// HTTP timeout in seconds.
    #[arg(long, env = "TGN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// List matching documents without downloading.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// CSV output path.
    #[arg(short, long, env = "TGN_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Print records as JSON on stdout instead of writing the CSV.
    #[arg(long, env = "TGN_JSON")]
    json: bool,

    /// Documents processed at once.
    #[arg(short, long, env = "TGN_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,
}

impl Command {
    /// Whether this command reads documents after any scraping is done.
    /// A dry run only lists what would be downloaded.
    fn extracts(&self) -> bool {
        match self {
            Command::Scrape(_) => false,
            Command::Extract(_) => true,
            Command::Run { scrape, .. } => !scrape.dry_run,
        }
    }
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is
    // active; the bar already reports every document.
    let json = matches!(
        &cli.command,
        Command::Extract(ExtractArgs { json: true, .. })
            | Command::Run {
                extract: ExtractArgs { json: true, .. },
                ..
            }
    );
    let show_progress = cli.command.extracts() && !cli.quiet && !cli.no_progress && !json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Scrape(args) => {
            run_scrape(&cli, args).await?;
        }
        Command::Extract(args) => {
            run_extract(&cli, args, show_progress).await?;
        }
        Command::Run { scrape, extract } => {
            run_scrape(&cli, scrape).await?;
            if cli.command.extracts() {
                run_extract(&cli, extract, show_progress).await?;
            }
        }
    }

    Ok(())
}

async fn run_scrape(cli: &Cli, args: &ScrapeArgs) -> Result<()> {
    let config = build_scrape_config(args, cli.pdf_dir.clone())?;

    if args.dry_run {
        let links = discover(&config).await.context("Failed to read listing")?;
        for link in &links {
            println!("{}  {}  {}", link.date, link.filename(), link.url);
        }
        if !cli.quiet {
            eprintln!("{} result documents in range", bold(&links.len().to_string()));
        }
        return Ok(());
    }

    let stats = scrape(&config).await.context("Scrape failed")?;
    if !cli.quiet {
        print_scrape_summary(&stats, &config);
    }
    Ok(())
}

async fn run_extract(cli: &Cli, args: &ExtractArgs, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_extract_config(args, cli.pdf_dir.clone(), progress_cb)?;

    let output = if args.json {
        let extractor = extract::bind_pdfium(&config)
            .await
            .context("Failed to load pdfium")?;
        let output = extract::extract_dir(&config, extractor)
            .await
            .context("Extraction failed")?;

        let json = sink::to_json(&output.records).context("Failed to serialise records")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
        output
    } else {
        extract::extract_to_file(&config)
            .await
            .context("Extraction failed")?
    };

    if !cli.quiet && !args.json {
        print_extract_summary(&output, &config);
    }
    Ok(())
}

/// Map CLI args to `ScrapeConfig`.
fn build_scrape_config(args: &ScrapeArgs, pdf_dir: PathBuf) -> Result<ScrapeConfig> {
    let defaults = DateRange::default();
    ScrapeConfig::builder()
        .listing_url(args.listing_url.clone())
        .document_base(args.document_base.clone())
        .download_dir(pdf_dir)
        .range(
            args.from.unwrap_or(defaults.start),
            args.to.unwrap_or(defaults.end),
        )
        .download_timeout_secs(args.download_timeout)
        .overwrite(args.overwrite)
        .build()
        .context("Invalid scrape configuration")
}

/// Map CLI args to `ExtractConfig`.
fn build_extract_config(
    args: &ExtractArgs,
    pdf_dir: PathBuf,
    progress: Option<ProgressCallback>,
) -> Result<ExtractConfig> {
    let mut builder = ExtractConfig::builder()
        .pdf_dir(pdf_dir)
        .output_path(args.output.clone())
        .concurrency(args.concurrency);

    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid extract configuration")
}

fn print_scrape_summary(stats: &ScrapeStats, config: &ScrapeConfig) {
    eprintln!(
        "{}  {} listed  {} in range  {} downloaded  {} already present  →  {}",
        if stats.failed == 0 { green("✔") } else { cyan("⚠") },
        stats.listed,
        stats.matched,
        bold(&stats.downloaded.to_string()),
        dim(&stats.already_present.to_string()),
        bold(&config.download_dir.display().to_string()),
    );
    if stats.failed > 0 {
        eprintln!("   {} downloads failed", red(&stats.failed.to_string()));
    }
}

fn print_extract_summary(output: &ExtractionOutput, config: &ExtractConfig) {
    let stats = &output.stats;
    eprintln!(
        "{}  {} records  from {}/{} documents  {}ms  →  {}",
        if stats.failed == 0 { green("✔") } else { cyan("⚠") },
        bold(&stats.records.to_string()),
        stats.succeeded,
        stats.documents,
        stats.total_duration_ms,
        bold(&config.output_path.display().to_string()),
    );
    for outcome in output.outcomes.iter().filter(|o| o.is_failed()) {
        if let Some(error) = outcome.error() {
            eprintln!("   {} {}: {}", dim("skipped"), outcome.document(), error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tgn-bonds").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn run_dry_run_skips_extraction() {
        assert!(!parse(&["run", "--dry-run"]).command.extracts());
        assert!(parse(&["run"]).command.extracts());
    }

    #[test]
    fn scrape_never_extracts() {
        assert!(!parse(&["scrape"]).command.extracts());
        assert!(parse(&["extract", "--json"]).command.extracts());
    }

    #[test]
    fn dates_parse_as_iso() {
        let cli = parse(&["scrape", "--from", "2024-01-01", "--to", "2024-06-30"]);
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.to, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert!(parse_date("15/03/2024").is_err());
    }
}
