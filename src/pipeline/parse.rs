//! Term-block parsing: turn a result document's text into term summaries.
//!
//! ## Document layout
//!
//! Each auctioned lot is announced by a term line and followed, a few lines
//! further down, by an enumerated summary line holding its totals:
//!
//! ```text
//! Plazo: 728 días / 2 años
//! Valor nominal  Tasa  Adjudicado
//! 1) 1.000,00  2,50  900,00
//! ```
//!
//! The summary columns are *demanded amount, rate, awarded amount*. Page
//! headers, footers and unrelated figures sit around these blocks, so only
//! lines carrying the `N)` marker are ever read as numbers.
//!
//! ## Passes
//!
//! 1. [`segment`] splits the raw text into trimmed, non-empty lines
//! 2. [`classify`] looks for a rejection marker once, on the raw text
//! 3. [`extract_records`] pairs each term line with its summary line

use crate::error::DocumentError;
use crate::output::{RejectionReason, TermSummary};
use crate::pipeline::numeric::normalize_number;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines searched below a term line for its summary line.
pub const SUMMARY_LOOKAHEAD: usize = 9;

/// Numeric tokens a summary line needs to yield a record.
const SUMMARY_FIELDS: usize = 3;

static RE_TERM_DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Plazo:\s*([0-9]+)").unwrap());

static RE_ENUMERATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[0-9]+\)").unwrap());

static RE_ENUMERATED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[0-9]+\)\s*").unwrap());

static RE_NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9.,]+").unwrap());

/// Every line boundary pdfium text may carry, not only `\n` and `\r\n`.
static RE_LINE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c-\x1e\x{85}\x{2028}\x{2029}]").unwrap()
});

// ── Line segmentation ────────────────────────────────────────────────────────

/// Split text into whitespace-trimmed lines, dropping blank ones. Order is kept.
///
/// Bare `\r`, form feeds and the Unicode line/paragraph separators end a
/// line too.
pub fn segment(text: &str) -> Vec<&str> {
    RE_LINE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

// ── Rejection marker ─────────────────────────────────────────────────────────

/// Classify the whole document by rejection marker.
///
/// `DPM` wins over `DPF` when both appear anywhere in the text.
pub fn classify(full_text: &str) -> RejectionReason {
    if full_text.contains("DPM") {
        RejectionReason::Dpm
    } else if full_text.contains("DPF") {
        RejectionReason::Dpf
    } else {
        RejectionReason::None
    }
}

// ── Term blocks ──────────────────────────────────────────────────────────────

/// A term line mentions both `Plazo` and `días` (case-sensitive).
pub fn is_term_declaration(line: &str) -> bool {
    line.contains("Plazo") && line.contains("días")
}

/// Tenor from a `Plazo: N` marker, if present and representable.
pub fn parse_term_days(line: &str) -> Option<u32> {
    RE_TERM_DAYS
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
}

/// A summary line starts with `<digits>)`.
pub fn is_enumerated(line: &str) -> bool {
    RE_ENUMERATED.is_match(line)
}

/// Numeric-looking tokens after the `<digits>)` marker, left to right.
pub fn summary_tokens(line: &str) -> Vec<&str> {
    let start = RE_ENUMERATED_PREFIX
        .find(line)
        .map(|m| m.end())
        .unwrap_or(0);
    RE_NUMBER_TOKEN
        .find_iter(&line[start..])
        .map(|m| m.as_str())
        .collect()
}

/// Pair every term line with the first summary line below it and build one
/// [`TermSummary`] per pair.
///
/// For each term line, up to [`SUMMARY_LOOKAHEAD`] following lines are
/// searched. The first enumerated line ends the search whether or not it
/// yields a record; a line with fewer than three numbers yields none. A term
/// line with no summary inside the window is skipped.
///
/// # Errors
/// The first malformed number aborts the whole document with
/// [`DocumentError::NumericFormat`]; term blocks already parsed are dropped.
pub fn extract_records<S: AsRef<str>>(lines: &[S]) -> Result<Vec<TermSummary>, DocumentError> {
    let mut summaries = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let line: &str = line.as_ref();
        if !is_term_declaration(line) {
            continue;
        }
        let term_days = parse_term_days(line);

        let window_end = (i + 1 + SUMMARY_LOOKAHEAD).min(lines.len());
        let Some(summary_line) = lines[i + 1..window_end]
            .iter()
            .map(|candidate| candidate.as_ref())
            .find(|candidate: &&str| is_enumerated(candidate))
        else {
            continue;
        };

        let tokens = summary_tokens(summary_line);
        if tokens.len() < SUMMARY_FIELDS {
            continue;
        }

        summaries.push(TermSummary {
            term_days,
            amount_demanded: normalize_number(tokens[0])?,
            rate: normalize_number(tokens[1])?,
            amount_awarded: normalize_number(tokens[2])?,
        });
    }

    Ok(summaries)
}
