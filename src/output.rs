//! Output types: auction records, per-document outcomes and run statistics.
//!
//! [`AuctionRecord`] is the only entity that leaves the crate. Its serde
//! field names are the persisted CSV column names, in column order, so the
//! sink never has to restate the schema.

use crate::error::DocumentError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One auctioned term lot from one result document.
///
/// Built once per (document, matched term block) and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    /// Originating document, e.g. `BT_2024_03_15.pdf`.
    #[serde(rename = "filename")]
    pub source_document: String,

    /// Auction date derived from the document name; `None` when the name
    /// does not follow the `BT_YYYY_MM_DD.pdf` pattern.
    #[serde(rename = "date")]
    pub auction_date: Option<NaiveDate>,

    /// Tenor in days; `None` when the term line had no `Plazo: N`.
    #[serde(rename = "plazo_dias")]
    pub term_days: Option<u32>,

    #[serde(rename = "cantidad_demandada")]
    pub amount_demanded: f64,

    #[serde(rename = "cantidad_adjudicada")]
    pub amount_awarded: f64,

    /// Effective reference rate (TRE).
    #[serde(rename = "tre")]
    pub rate: f64,

    /// Document-level marker, identical for every record of a document.
    #[serde(rename = "motivo_rechazo")]
    pub rejection_reason: RejectionReason,
}

impl AuctionRecord {
    /// Attach document-level metadata to a parsed term summary.
    pub fn from_summary(
        source_document: impl Into<String>,
        auction_date: Option<NaiveDate>,
        rejection_reason: RejectionReason,
        summary: TermSummary,
    ) -> Self {
        Self {
            source_document: source_document.into(),
            auction_date,
            term_days: summary.term_days,
            amount_demanded: summary.amount_demanded,
            amount_awarded: summary.amount_awarded,
            rate: summary.rate,
            rejection_reason,
        }
    }
}

/// The numeric content of one term block, before document metadata is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermSummary {
    pub term_days: Option<u32>,
    pub amount_demanded: f64,
    pub amount_awarded: f64,
    pub rate: f64,
}

/// Rejection marker found anywhere in a document's text.
///
/// Serialises as `"DPM"`, `"DPF"` or an empty field (`null` in JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionReason {
    #[default]
    None,
    /// `DPM` marker present.
    Dpm,
    /// `DPF` marker present (and no `DPM`).
    Dpf,
}

impl RejectionReason {
    /// The marker as it appears in documents, or `None` when absent.
    pub fn marker(self) -> Option<&'static str> {
        match self {
            RejectionReason::None => None,
            RejectionReason::Dpm => Some("DPM"),
            RejectionReason::Dpf => Some("DPF"),
        }
    }
}

impl Serialize for RejectionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.marker() {
            Some(m) => serializer.serialize_str(m),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for RejectionReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(RejectionReason::None),
            Some("DPM") => Ok(RejectionReason::Dpm),
            Some("DPF") => Ok(RejectionReason::Dpf),
            Some(other) => Err(serde::de::Error::custom(format!(
                "unknown rejection marker {other:?}"
            ))),
        }
    }
}

/// Result of running one document through the pipeline.
///
/// A failed document contributes no records; the error is kept so callers
/// can log or count it.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Parsed {
        document: String,
        records: Vec<AuctionRecord>,
    },
    Failed {
        document: String,
        error: DocumentError,
    },
}

impl DocumentOutcome {
    pub fn document(&self) -> &str {
        match self {
            DocumentOutcome::Parsed { document, .. } | DocumentOutcome::Failed { document, .. } => {
                document
            }
        }
    }

    /// Records produced; empty for a failed document.
    pub fn records(&self) -> &[AuctionRecord] {
        match self {
            DocumentOutcome::Parsed { records, .. } => records,
            DocumentOutcome::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&DocumentError> {
        match self {
            DocumentOutcome::Parsed { .. } => None,
            DocumentOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DocumentOutcome::Failed { .. })
    }

    pub fn into_records(self) -> Vec<AuctionRecord> {
        match self {
            DocumentOutcome::Parsed { records, .. } => records,
            DocumentOutcome::Failed { .. } => Vec::new(),
        }
    }
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Documents attempted.
    pub documents: usize,
    /// Documents that parsed (possibly with zero term blocks).
    pub succeeded: usize,
    /// Documents that failed and contributed nothing.
    pub failed: usize,
    /// Records in the aggregated output.
    pub records: usize,
    pub total_duration_ms: u64,
}

impl ExtractionStats {
    pub fn from_outcomes(outcomes: &[DocumentOutcome], total_duration_ms: u64) -> Self {
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        Self {
            documents: outcomes.len(),
            succeeded: outcomes.len() - failed,
            failed,
            records: outcomes.iter().map(|o| o.records().len()).sum(),
            total_duration_ms,
        }
    }
}

/// Everything an extraction run produces.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// Aggregated records, ordered by `(auction_date, term_days)`.
    pub records: Vec<AuctionRecord>,
    /// One outcome per document, in document-name order.
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: ExtractionStats,
}

/// A result document announced on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionLink {
    pub date: NaiveDate,
    pub url: String,
}

impl AuctionLink {
    /// Local file name the document is stored under.
    pub fn filename(&self) -> String {
        crate::pipeline::fetch::document_filename(self.date)
    }
}

/// Counters for one scrape run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStats {
    /// Listing rows with a readable date and link.
    pub listed: usize,
    /// Links inside the date range that point at a BT result PDF.
    pub matched: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}
