//! Per-document stage: text in, dated auction records out.
//!
//! This is the failure boundary of the pipeline. Whatever goes wrong while
//! reading one document (no text, a malformed number) becomes a
//! [`DocumentOutcome::Failed`] with the cause attached, is logged with the
//! document name, and never reaches the other documents of the run.

use crate::error::DocumentError;
use crate::output::{AuctionRecord, DocumentOutcome};
use crate::pipeline::parse;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static RE_FILENAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BT_([0-9]{4})_([0-9]{2})_([0-9]{2})\.pdf").unwrap());

/// Auction date embedded in a `BT_YYYY_MM_DD.pdf` document name.
///
/// Returns `None` when the name does not match or the digits are not a
/// calendar date (e.g. `BT_2024_02_30.pdf`).
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let caps = RE_FILENAME_DATE.captures(name)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse one document's text into records.
///
/// `text` is `None` when the extraction backend produced nothing; blank text
/// is treated the same way.
pub fn parse_document(
    document: &str,
    text: Option<&str>,
) -> Result<Vec<AuctionRecord>, DocumentError> {
    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(DocumentError::EmptyText),
    };

    let auction_date = date_from_filename(document);
    if auction_date.is_none() {
        debug!("No auction date in document name: {}", document);
    }

    let reason = parse::classify(text);
    let lines = parse::segment(text);
    let summaries = parse::extract_records(&lines)?;

    Ok(summaries
        .into_iter()
        .map(|summary| AuctionRecord::from_summary(document, auction_date, reason, summary))
        .collect())
}

/// Run one document through the pipeline, turning any failure into an outcome.
pub fn process_document(document: &str, text: Option<&str>) -> DocumentOutcome {
    into_outcome(document, parse_document(document, text))
}

/// Like [`process_document`], for text straight from a [`TextExtractor`].
///
/// A read failure goes through the same boundary as a parse failure.
///
/// [`TextExtractor`]: crate::pipeline::text::TextExtractor
pub fn process_extracted(document: &str, text: Result<String, DocumentError>) -> DocumentOutcome {
    let parsed = text.and_then(|text| parse_document(document, Some(&text)));
    into_outcome(document, parsed)
}

fn into_outcome(
    document: &str,
    parsed: Result<Vec<AuctionRecord>, DocumentError>,
) -> DocumentOutcome {
    match parsed {
        Ok(records) => {
            debug!("{}: {} term records", document, records.len());
            DocumentOutcome::Parsed {
                document: document.to_string(),
                records,
            }
        }
        Err(error) => {
            warn!("Skipping {}: {}", document, error);
            DocumentOutcome::Failed {
                document: document.to_string(),
                error,
            }
        }
    }
}
