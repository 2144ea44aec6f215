//! Pipeline stages for scraping and parsing auction result documents.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ text ──▶ document ──▶ aggregate ──▶ sink
//! (HTTP)   (pdfium)  (parse)      (sort)        (CSV)
//! ```
//!
//! 1. [`fetch`]: scan the listing page and download `BT_YYYY_MM_DD.pdf` files
//! 2. [`text`]: plain text of a document; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`document`]: per-document failure boundary. Date from the file name,
//!    rejection marker, term blocks via [`parse`] and [`numeric`]
//! 4. [`aggregate`]: flatten every document's records into one ordered table
//! 5. [`sink`]: write the table as CSV (or render it as JSON)

pub mod aggregate;
pub mod document;
pub mod fetch;
pub mod numeric;
pub mod parse;
pub mod sink;
pub mod text;
