//! Error types for the tgn-bonds library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TgnError`]: **Fatal**: the run cannot proceed at all (listing page
//!   unreachable, PDF directory unreadable, pdfium missing, output not
//!   writable). Returned as `Err(TgnError)` from the top-level entry points.
//!
//! * [`DocumentError`]: **Non-fatal**: a single document failed (text
//!   extraction produced nothing, a numeric token was malformed) but every
//!   other document is fine. Stored inside
//!   [`crate::output::DocumentOutcome::Failed`] so the run carries on and the
//!   failure stays visible in logs and counters.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tgn-bonds library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum TgnError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The auction listing page could not be requested at all.
    #[error("Failed to fetch listing page '{url}': {reason}\nCheck your internet connection.")]
    ListingFetchFailed { url: String, reason: String },

    /// The listing page answered with a non-success status.
    #[error("Listing page '{url}' returned HTTP {status}")]
    ListingHttpStatus { url: String, status: u16 },

    /// A document download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// A document download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── File-system errors ────────────────────────────────────────────────
    /// The PDF directory could not be listed.
    #[error("Cannot read PDF directory '{path}': {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialised for the sink.
    #[error("Failed to serialise records: {0}")]
    Serialization(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs a pdfium shared library. Either:\n\
  • install libpdfium where the system loader finds it, or\n\
  • pass --pdfium-lib /path/to/dir (or set PDFIUM_LIB_PATH).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Any of these turns the document into "zero records"; the run continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// A numeric token could not be normalised. Aborts the whole document.
    #[error("malformed numeric token {token:?}")]
    NumericFormat { token: String },

    /// The text backend failed to read the document.
    #[error("text extraction failed: {detail}")]
    DocumentRead { detail: String },

    /// The text backend succeeded but produced no text.
    #[error("text extraction returned no text")]
    EmptyText,
}
