//! Progress-callback trait for per-document extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through a directory of result documents.
//! The CLI uses this to drive its progress bar; library callers can forward
//! the same events to counters or logs.
//!
//! # Example
//!
//! ```rust
//! use tgn_bonds::{ExtractionProgressCallback, ExtractConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for FailureCounter {
//!     fn on_document_error(&self, document: &str, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{document}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failed: AtomicUsize::new(0) });
//!
//! let config = ExtractConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it processes each document.
///
/// Documents are processed concurrently, so `on_document_*` may be called
/// from several threads at once. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document's text is extracted.
    fn on_document_start(&self, document: &str) {
        let _ = document;
    }

    /// Called when a document parsed; `records` may be zero.
    fn on_document_complete(&self, document: &str, records: usize) {
        let _ = (document, records);
    }

    /// Called when a document failed and contributes no records.
    fn on_document_error(&self, document: &str, error: &str) {
        let _ = (document, error);
    }

    /// Called once after every document has been attempted.
    fn on_run_complete(&self, total_documents: usize, succeeded: usize) {
        let _ = (total_documents, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        records: AtomicUsize,
        errors: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_document_start(&self, _document: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _document: &str, records: usize) {
            self.records.fetch_add(records, Ordering::SeqCst);
        }

        fn on_document_error(&self, _document: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total: usize, succeeded: usize) {
            self.succeeded.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_document_start("BT_2024_03_15.pdf");
        cb.on_document_complete("BT_2024_03_15.pdf", 3);
        cb.on_document_error("BT_2024_03_22.pdf", "no text");
        cb.on_run_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let cb: Arc<TrackingCallback> = Arc::default();
        let dyn_cb: ProgressCallback = cb.clone();

        dyn_cb.on_document_start("a.pdf");
        dyn_cb.on_document_complete("a.pdf", 2);
        dyn_cb.on_document_start("b.pdf");
        dyn_cb.on_document_error("b.pdf", "text extraction returned no text");
        dyn_cb.on_run_complete(2, 1);

        assert_eq!(cb.starts.load(Ordering::SeqCst), 2);
        assert_eq!(cb.records.load(Ordering::SeqCst), 2);
        assert_eq!(cb.errors.load(Ordering::SeqCst), 1);
        assert_eq!(cb.succeeded.load(Ordering::SeqCst), 1);
    }
}
