//! Extraction entry points: result documents in, ordered auction records out.
//!
//! [`extract_dir`] is the primary API. It reads every `*.pdf` in the
//! configured directory, runs each through the per-document pipeline
//! concurrently, and aggregates the records. A document that fails is logged,
//! counted in [`ExtractionStats`] and otherwise left out; only problems that
//! make the whole run meaningless (unreadable directory, pdfium missing,
//! output not writable) are returned as errors.
//!
//! [`extract_texts`] runs the same pipeline over text the caller already has,
//! with no file system or pdfium involved.

use crate::config::ExtractConfig;
use crate::error::TgnError;
use crate::output::{DocumentOutcome, ExtractionOutput, ExtractionStats};
use crate::pipeline::text::{self, PdfiumTextExtractor, TextExtractor};
use crate::pipeline::{aggregate, document, sink};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract records from every result document in `config.pdf_dir`.
///
/// # Errors
/// Returns `Err(TgnError)` only when the directory cannot be listed.
/// Per-document failures are reported in `output.outcomes` and
/// `output.stats.failed`.
pub async fn extract_dir(
    config: &ExtractConfig,
    extractor: Arc<dyn TextExtractor>,
) -> Result<ExtractionOutput, TgnError> {
    let paths = list_documents(&config.pdf_dir)?;
    info!(
        "Found {} result documents in {}",
        paths.len(),
        config.pdf_dir.display()
    );
    Ok(extract_files(paths, config, extractor).await)
}

/// Extract records from the given files.
///
/// Documents are processed up to `config.concurrency` at a time; outcomes
/// are returned sorted by document name so output never depends on which
/// extraction finished first.
pub async fn extract_files(
    paths: Vec<PathBuf>,
    config: &ExtractConfig,
    extractor: Arc<dyn TextExtractor>,
) -> ExtractionOutput {
    let start = Instant::now();
    let total = paths.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    let mut outcomes: Vec<DocumentOutcome> = stream::iter(paths.into_iter().map(|path| {
        let extractor = Arc::clone(&extractor);
        let callback = config.progress_callback.clone();
        async move {
            let name = document_name(&path);
            if let Some(ref cb) = callback {
                cb.on_document_start(&name);
            }

            let text = text::extract_text_blocking(extractor, path).await;
            let outcome = document::process_extracted(&name, text);

            if let Some(ref cb) = callback {
                match outcome.error() {
                    None => cb.on_document_complete(&name, outcome.records().len()),
                    Some(e) => cb.on_document_error(&name, &e.to_string()),
                }
            }
            outcome
        }
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    outcomes.sort_by(|a, b| a.document().cmp(b.document()));

    let output = assemble(outcomes, start);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, output.stats.succeeded);
    }
    output
}

/// Run the pipeline over `(document name, text)` pairs already in memory.
///
/// `None` text means the caller's backend produced nothing for that document.
pub fn extract_texts<I, S>(documents: I) -> ExtractionOutput
where
    I: IntoIterator<Item = (S, Option<String>)>,
    S: AsRef<str>,
{
    let start = Instant::now();
    let outcomes = documents
        .into_iter()
        .map(|(name, text)| document::process_document(name.as_ref(), text.as_deref()))
        .collect();
    assemble(outcomes, start)
}

/// Extract with pdfium and write the CSV to `config.output_path`.
pub async fn extract_to_file(config: &ExtractConfig) -> Result<ExtractionOutput, TgnError> {
    let extractor = bind_pdfium(config).await?;
    let output = extract_dir(config, extractor).await?;
    sink::write_csv(&config.output_path, &output.records).await?;
    info!(
        "Wrote {} records to {}",
        output.records.len(),
        config.output_path.display()
    );
    Ok(output)
}

/// Synchronous wrapper around [`extract_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_to_file_sync(config: &ExtractConfig) -> Result<ExtractionOutput, TgnError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TgnError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_to_file(config))
}

/// Bind pdfium on the blocking pool and wrap it as a shared extractor.
pub async fn bind_pdfium(config: &ExtractConfig) -> Result<Arc<dyn TextExtractor>, TgnError> {
    let lib_dir = config.pdfium_lib_path.clone();
    let extractor = tokio::task::spawn_blocking(move || PdfiumTextExtractor::new(lib_dir))
        .await
        .map_err(|e| TgnError::Internal(format!("pdfium bind task panicked: {}", e)))??;
    Ok(Arc::new(extractor))
}

/// `*.pdf` files directly inside `dir`, sorted by name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, TgnError> {
    let entries = std::fs::read_dir(dir).map_err(|e| TgnError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && document_name(path).ends_with(".pdf"))
        .collect();
    paths.sort();
    debug!("{} documents listed in {}", paths.len(), dir.display());
    Ok(paths)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn assemble(outcomes: Vec<DocumentOutcome>, start: Instant) -> ExtractionOutput {
    let records = aggregate::aggregate(outcomes.iter().map(|o| o.records().to_vec()));
    let stats = ExtractionStats::from_outcomes(&outcomes, start.elapsed().as_millis() as u64);

    info!(
        "Extraction complete: {}/{} documents, {} records, {}ms",
        stats.succeeded, stats.documents, stats.records, stats.total_duration_ms
    );
    if stats.failed > 0 {
        warn!("{} documents contributed no records", stats.failed);
    }

    ExtractionOutput {
        records,
        outcomes,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use std::collections::HashMap;

    struct MapExtractor(HashMap<String, Result<String, DocumentError>>);

    impl TextExtractor for MapExtractor {
        fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
            self.0
                .get(&document_name(path))
                .cloned()
                .unwrap_or(Err(DocumentError::DocumentRead {
                    detail: "missing".into(),
                }))
        }
    }

    #[test]
    fn extract_texts_counts_failures() {
        let out = extract_texts(vec![
            (
                "BT_2024_03_15.pdf",
                Some("Plazo: 364 días\n1) 1,00 2,00 3,00".to_string()),
            ),
            ("BT_2024_03_22.pdf", None),
        ]);
        assert_eq!(out.stats.documents, 2);
        assert_eq!(out.stats.failed, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].term_days, Some(364));
    }

    #[tokio::test]
    async fn extract_files_sorts_outcomes_and_isolates_failures() {
        let mut texts = HashMap::new();
        texts.insert(
            "BT_2024_03_22.pdf".to_string(),
            Ok("Plazo: 728 días\n1) 2,00 3,00 4,00".to_string()),
        );
        texts.insert(
            "BT_2024_03_15.pdf".to_string(),
            Ok("Plazo: 364 días\n1) 1,00 2,00 3,00".to_string()),
        );
        texts.insert(
            "BT_2024_03_08.pdf".to_string(),
            Err(DocumentError::DocumentRead {
                detail: "corrupt".into(),
            }),
        );

        let config = ExtractConfig::builder().concurrency(3).build().unwrap();
        let paths = vec![
            PathBuf::from("BT_2024_03_22.pdf"),
            PathBuf::from("BT_2024_03_08.pdf"),
            PathBuf::from("BT_2024_03_15.pdf"),
        ];
        let out = extract_files(paths, &config, Arc::new(MapExtractor(texts))).await;

        let names: Vec<&str> = out.outcomes.iter().map(|o| o.document()).collect();
        assert_eq!(
            names,
            vec!["BT_2024_03_08.pdf", "BT_2024_03_15.pdf", "BT_2024_03_22.pdf"]
        );
        assert!(out.outcomes[0].is_failed());
        assert_eq!(out.stats.failed, 1);
        assert_eq!(out.stats.succeeded, 2);
        let terms: Vec<Option<u32>> = out.records.iter().map(|r| r.term_days).collect();
        assert_eq!(terms, vec![Some(364), Some(728)]);
    }

    #[test]
    fn list_documents_filters_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["BT_2024_03_22.pdf", "BT_2024_03_15.pdf", "notes.txt", "BT_X.PDF"] {
            std::fs::write(dir.path().join(name), b"%PDF").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let names: Vec<String> = list_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| document_name(p))
            .collect();
        assert_eq!(names, vec!["BT_2024_03_15.pdf", "BT_2024_03_22.pdf"]);
    }

    #[test]
    fn list_documents_missing_dir() {
        let err = list_documents(Path::new("/nonexistent/tgn/pdfs")).unwrap_err();
        assert!(matches!(err, TgnError::DirectoryUnreadable { .. }));
    }
}
