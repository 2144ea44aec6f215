//! Integration tests for the extraction pipeline.
//!
//! These run entirely offline: documents are plain-text files with `.pdf`
//! names in a temp directory, read by a [`TextExtractor`] that returns the
//! file contents. Everything after text extraction (parsing, failure
//! isolation, ordering, CSV output) is the production code path.
//!
//! Run with:
//!   cargo test --test pipeline

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tgn_bonds::pipeline::sink;
use tgn_bonds::{
    extract_dir, extract_texts, AuctionRecord, DocumentError, ExtractConfig,
    ExtractionProgressCallback, RejectionReason, TextExtractor,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Treats every "PDF" as a UTF-8 text file.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
        std::fs::read_to_string(path).map_err(|e| DocumentError::DocumentRead {
            detail: e.to_string(),
        })
    }
}

/// A 50-line result document with one term block buried in boilerplate.
fn noisy_single_term() -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("BANCO CENTRAL DE BOLIVIA".into());
    lines.push("Gerencia de Operaciones Monetarias".into());
    lines.push("RESULTADOS DE LA SUBASTA DE BONOS DEL TESORO GENERAL DE LA NACIÓN".into());
    for i in 0..15 {
        lines.push(format!("Referencia {} del reglamento, artículo {}.", 2024 + i, i + 3));
    }
    lines.push("Plazo de liquidación según normativa vigente".into());
    lines.push("Plazo: 364 días".into());
    lines.push("Moneda: Bolivianos".into());
    lines.push("Valor nominal    Tasa    Adjudicado".into());
    lines.push("1) 1.500,00 5,25 1.200,00".into());
    lines.push("2) 9.999,00 9,99 9.999,00".into());
    while lines.len() < 50 {
        lines.push(format!("Página {} de 3", lines.len() % 3 + 1));
    }
    lines.join("\n")
}

fn write_docs(dir: &Path, docs: &[(&str, &str)]) {
    for (name, text) in docs {
        std::fs::write(dir.join(name), text).unwrap();
    }
}

fn config_for(dir: &Path) -> ExtractConfig {
    ExtractConfig::builder()
        .pdf_dir(dir)
        .output_path(dir.join("out").join("bonos_tgn_auctions.csv"))
        .concurrency(2)
        .build()
        .unwrap()
}

fn key(r: &AuctionRecord) -> (String, Option<u32>) {
    (
        r.auction_date.map(|d| d.to_string()).unwrap_or_default(),
        r.term_days,
    )
}

// ── Single-document behaviour ────────────────────────────────────────────────

#[test]
fn test_noisy_document_yields_one_record() {
    let text = noisy_single_term();
    assert_eq!(text.lines().count(), 50);

    let out = extract_texts(vec![("BT_2024_03_15.pdf", Some(text))]);
    assert_eq!(out.stats.failed, 0);
    assert_eq!(out.records.len(), 1);

    let r = &out.records[0];
    assert_eq!(r.source_document, "BT_2024_03_15.pdf");
    assert_eq!(r.auction_date.map(|d| d.to_string()).as_deref(), Some("2024-03-15"));
    assert_eq!(r.term_days, Some(364));
    assert_eq!(r.amount_demanded, 1500.0);
    assert_eq!(r.rate, 5.25);
    assert_eq!(r.amount_awarded, 1200.0);
    assert_eq!(r.rejection_reason, RejectionReason::None);
}

#[test]
fn test_malformed_number_discards_whole_document() {
    let text = "Plazo: 364 días\n1) 1,00 2,00 3,00\nPlazo: 728 días\n1) 1,2,3 4,00 5,00";
    let out = extract_texts(vec![("BT_2024_03_15.pdf", Some(text.to_string()))]);
    assert!(out.records.is_empty());
    assert_eq!(out.stats.failed, 1);
    assert!(matches!(
        out.outcomes[0].error(),
        Some(DocumentError::NumericFormat { .. })
    ));
}

// ── Directory runs ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_directory_run_orders_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            (
                "BT_2024_03_22.pdf",
                "Propuestas rechazadas: DPF\n\
                 Plazo: 728 días\n1) 2.000,00 6,10 1.000,00\n\
                 Plazo: 364 días\n1) 3.000,00 5,40 2.500,00",
            ),
            ("BT_2024_03_15.pdf", "Plazo: 1092 días\nx\n1) 500,00 7,00 500,00"),
            ("BT_2024_03_08.pdf", "Plazo: 364 días\n1) 1,2,3 4,00 5,00"),
            ("BT_2024_03_01.pdf", "   \n  "),
            ("resultado.pdf", "Plazo: 364 días\n1) 10,00 1,00 5,00"),
            ("notes.txt", "Plazo: 1 días\n1) 1,00 1,00 1,00"),
        ],
    );

    let out = extract_dir(&config_for(dir.path()), Arc::new(PlainTextExtractor))
        .await
        .unwrap();

    assert_eq!(out.stats.documents, 5);
    assert_eq!(out.stats.succeeded, 3);
    assert_eq!(out.stats.failed, 2);
    assert_eq!(out.stats.records, 4);

    let keys: Vec<(String, Option<u32>)> = out.records.iter().map(key).collect();
    assert_eq!(
        keys,
        vec![
            ("2024-03-15".to_string(), Some(1092)),
            ("2024-03-22".to_string(), Some(364)),
            ("2024-03-22".to_string(), Some(728)),
            (String::new(), Some(364)),
        ]
    );
    assert!(out.records[1..3]
        .iter()
        .all(|r| r.rejection_reason == RejectionReason::Dpf));

    let failed: Vec<&str> = out
        .outcomes
        .iter()
        .filter(|o| o.is_failed())
        .map(|o| o.document())
        .collect();
    assert_eq!(failed, vec!["BT_2024_03_01.pdf", "BT_2024_03_08.pdf"]);
}

#[test]
fn test_directory_run_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            ("BT_2024_03_15.pdf", "DPM\nPlazo: 728 días\n1) 1.234,56 2,5 900,00"),
            ("BT_2024_03_22.pdf", "sin resultados"),
        ],
    );
    let config = config_for(dir.path());

    let out = tokio_test::block_on(async {
        let out = extract_dir(&config, Arc::new(PlainTextExtractor))
            .await
            .unwrap();
        sink::write_csv(&config.output_path, &out.records)
            .await
            .unwrap();
        out
    });
    assert_eq!(out.stats.succeeded, 2);

    let csv = std::fs::read_to_string(&config.output_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "filename,date,plazo_dias,cantidad_demandada,cantidad_adjudicada,tre,motivo_rechazo",
            "BT_2024_03_15.pdf,2024-03-15,728,1234.56,900.0,2.5,DPM",
        ]
    );
}

#[tokio::test]
async fn test_progress_events_cover_every_document() {
    #[derive(Default)]
    struct Counts {
        started: AtomicUsize,
        completed: AtomicUsize,
        errored: AtomicUsize,
        run_total: AtomicUsize,
    }

    impl ExtractionProgressCallback for Counts {
        fn on_run_start(&self, total: usize) {
            self.run_total.store(total, Ordering::SeqCst);
        }
        fn on_document_start(&self, _document: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_complete(&self, _document: &str, _records: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_error(&self, _document: &str, _error: &str) {
            self.errored.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            ("BT_2024_03_15.pdf", "Plazo: 364 días\n1) 1,00 2,00 3,00"),
            ("BT_2024_03_22.pdf", ""),
        ],
    );

    let counts = Arc::new(Counts::default());
    let config = ExtractConfig::builder()
        .pdf_dir(dir.path())
        .progress_callback(counts.clone() as Arc<dyn ExtractionProgressCallback>)
        .build()
        .unwrap();

    extract_dir(&config, Arc::new(PlainTextExtractor))
        .await
        .unwrap();

    assert_eq!(counts.run_total.load(Ordering::SeqCst), 2);
    assert_eq!(counts.started.load(Ordering::SeqCst), 2);
    assert_eq!(counts.completed.load(Ordering::SeqCst), 1);
    assert_eq!(counts.errored.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_directory_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = extract_dir(&config_for(dir.path()), Arc::new(PlainTextExtractor))
        .await
        .unwrap();
    assert_eq!(out.stats.documents, 0);
    assert!(out.records.is_empty());
}
