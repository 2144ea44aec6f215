//! Configuration types for scraping and extraction runs.
//!
//! Nothing in the library reads a fixed folder or URL: every location is a
//! field on [`ScrapeConfig`] or [`ExtractConfig`], passed in by the caller.
//! Both are built through a builder whose `build()` validates the values, so
//! the core can be driven from tests with temp directories and no network.

use crate::error::TgnError;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Listing page that announces BONOS TGN auction results.
pub const DEFAULT_LISTING_URL: &str = "https://www.bcb.gob.bo/?q=resultado-subastas-bonos-tesoro";

/// Origin used to resolve relative document links on the listing page.
pub const DEFAULT_DOCUMENT_BASE: &str = "https://www.bcb.gob.bo";

pub const DEFAULT_PDF_DIR: &str = "data/pdfs/tgn_bonos";

pub const DEFAULT_OUTPUT_PATH: &str = "data/bonos_tgn_auctions.csv";

/// Inclusive range of auction dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    /// 2023-01-01 up to today.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            end: chrono::Local::now().date_naive(),
        }
    }
}

// ── Scrape ───────────────────────────────────────────────────────────────

/// Configuration for discovering and downloading result documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Listing page to scan for auction rows.
    pub listing_url: String,

    /// Prefix for relative `href`s found on the listing page.
    pub document_base: String,

    /// Where downloaded PDFs are stored, as `BT_YYYY_MM_DD.pdf`.
    pub download_dir: PathBuf,

    /// Only auctions dated inside this range are downloaded.
    pub range: DateRange,

    /// Timeout for the listing request and each download, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Re-download documents that already exist locally. Default: false.
    pub overwrite: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            document_base: DEFAULT_DOCUMENT_BASE.to_string(),
            download_dir: PathBuf::from(DEFAULT_PDF_DIR),
            range: DateRange::default(),
            download_timeout_secs: 120,
            overwrite: false,
        }
    }
}

impl ScrapeConfig {
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScrapeConfig`].
#[derive(Debug)]
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    pub fn listing_url(mut self, url: impl Into<String>) -> Self {
        self.config.listing_url = url.into();
        self
    }

    pub fn document_base(mut self, base: impl Into<String>) -> Self {
        self.config.document_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.config.range = DateRange::new(start, end);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScrapeConfig, TgnError> {
        let c = &self.config;
        if c.range.start > c.range.end {
            return Err(TgnError::InvalidConfig(format!(
                "date range start {} is after end {}",
                c.range.start, c.range.end
            )));
        }
        if c.download_timeout_secs == 0 {
            return Err(TgnError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if !c.listing_url.starts_with("http://") && !c.listing_url.starts_with("https://") {
            return Err(TgnError::InvalidConfig(format!(
                "listing URL must be http(s), got '{}'",
                c.listing_url
            )));
        }
        Ok(self.config)
    }
}

// ── Extract ──────────────────────────────────────────────────────────────

/// Configuration for turning downloaded PDFs into auction records.
#[derive(Clone)]
pub struct ExtractConfig {
    /// Directory scanned for `*.pdf` result documents.
    pub pdf_dir: PathBuf,

    /// CSV file the aggregated records are written to.
    pub output_path: PathBuf,

    /// Documents processed at once. Default: 4.
    ///
    /// Documents share no state, so this only bounds how many pdfium text
    /// extractions run on the blocking pool at the same time.
    pub concurrency: usize,

    /// Directory holding the pdfium shared library. `None` binds the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from(DEFAULT_PDF_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            concurrency: 4,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("pdf_dir", &self.pdf_dir)
            .field("output_path", &self.output_path)
            .field("concurrency", &self.concurrency)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractConfig {
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn pdf_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdf_dir = dir.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, TgnError> {
        if self.config.concurrency == 0 {
            return Err(TgnError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
