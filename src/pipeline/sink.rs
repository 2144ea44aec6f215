//! Result sink: persist aggregated records as CSV (or render them as JSON).
//!
//! The CSV layout is the contract downstream consumers read, so the header
//! is written explicitly and always, even for a run that found nothing.

use crate::error::TgnError;
use crate::output::AuctionRecord;
use std::path::Path;

/// CSV header, in column order.
pub const COLUMNS: [&str; 7] = [
    "filename",
    "date",
    "plazo_dias",
    "cantidad_demandada",
    "cantidad_adjudicada",
    "tre",
    "motivo_rechazo",
];

/// Render records as CSV. Absent values become empty fields.
pub fn to_csv_bytes(records: &[AuctionRecord]) -> Result<Vec<u8>, TgnError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(COLUMNS)
        .map_err(|e| TgnError::Serialization(e.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| TgnError::Serialization(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| TgnError::Serialization(e.to_string()))
}

/// Render records as a pretty JSON array.
pub fn to_json(records: &[AuctionRecord]) -> Result<String, TgnError> {
    serde_json::to_string_pretty(records).map_err(|e| TgnError::Serialization(e.to_string()))
}

/// Write records to `path` as CSV.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated table behind.
pub async fn write_csv(path: &Path, records: &[AuctionRecord]) -> Result<(), TgnError> {
    let bytes = to_csv_bytes(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TgnError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| TgnError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| TgnError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
