//! # tgn-bonds
//!
//! Collect the Banco Central de Bolivia's BONOS TGN auction results into one
//! tabular dataset.
//!
//! ## Why this crate?
//!
//! The central bank publishes each Treasury bond auction as a separate PDF
//! linked from a listing page. The numbers that matter (term, amount
//! demanded, amount awarded, reference rate) sit in a small block under each
//! `Plazo:` heading, surrounded by pages of boilerplate. This crate downloads
//! the documents, pulls the text out with pdfium, finds those blocks and
//! writes every term of every auction as one CSV row.
//!
//! ## Pipeline Overview
//!
//! ```text
//! listing page
//!  │
//!  ├─ 1. Scrape     views-row entries → BT_YYYY_MM_DD.pdf in the date range
//!  ├─ 2. Text       pdfium page text (CPU-bound, spawn_blocking)
//!  ├─ 3. Document   date from file name, DPM/DPF marker, Plazo blocks
//!  ├─ 4. Aggregate  all records ordered by (date, term)
//!  └─ 5. Sink       CSV with a fixed seven-column header
//! ```
//!
//! A document that cannot be read or parsed is skipped with a warning and
//! counted; it never aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tgn_bonds::{extract_to_file, scrape, ExtractConfig, ScrapeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scraped = scrape(&ScrapeConfig::default()).await?;
//!     eprintln!("{} new documents", scraped.downloaded);
//!
//!     let output = extract_to_file(&ExtractConfig::default()).await?;
//!     eprintln!(
//!         "{} records from {}/{} documents",
//!         output.stats.records, output.stats.succeeded, output.stats.documents
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tgn-bonds` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! tgn-bonds = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod scrape;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DateRange, ExtractConfig, ExtractConfigBuilder, ScrapeConfig, ScrapeConfigBuilder};
pub use error::{DocumentError, TgnError};
pub use extract::{extract_dir, extract_texts, extract_to_file, extract_to_file_sync};
pub use output::{
    AuctionLink, AuctionRecord, DocumentOutcome, ExtractionOutput, ExtractionStats,
    RejectionReason, ScrapeStats, TermSummary,
};
pub use pipeline::text::{PdfiumTextExtractor, TextExtractor};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use scrape::{discover, scrape};
