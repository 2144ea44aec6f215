//! Scrape entry point: listing page in, result documents on disk out.
//!
//! ## Data Flow
//!
//! ```text
//! listing URL ──▶ fetch_listing ──▶ parse_listing ──▶ select_links ──▶ download_documents
//!                 (HTTP GET)        (views-row)       (date range,      (skip existing,
//!                                                      BT*.pdf)          atomic write)
//! ```
//!
//! Only the listing request is fatal. A document that fails to download is
//! logged and counted in [`ScrapeStats::failed`]; the extraction step simply
//! never sees it.

use crate::config::ScrapeConfig;
use crate::error::TgnError;
use crate::output::{AuctionLink, ScrapeStats};
use crate::pipeline::fetch;
use tracing::{info, warn};

/// Fetch the listing, then download every in-range result document.
pub async fn scrape(config: &ScrapeConfig) -> Result<ScrapeStats, TgnError> {
    let client = fetch::build_client(config)?;
    let links = discover_with(&client, config).await?;

    let mut stats = fetch::download_documents(&client, &links.selected, config).await?;
    stats.listed = links.listed;

    info!(
        "Scrape complete: {} rows listed, {} in range, {} downloaded, {} already present, {} failed",
        stats.listed, stats.matched, stats.downloaded, stats.already_present, stats.failed
    );
    if stats.failed > 0 {
        warn!("{} documents could not be downloaded", stats.failed);
    }
    Ok(stats)
}

/// Fetch and parse the listing without downloading anything.
///
/// Useful for a dry run: returns the links that [`scrape`] would fetch.
pub async fn discover(config: &ScrapeConfig) -> Result<Vec<AuctionLink>, TgnError> {
    let client = fetch::build_client(config)?;
    Ok(discover_with(&client, config).await?.selected)
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct Discovered {
    listed: usize,
    selected: Vec<AuctionLink>,
}

async fn discover_with(
    client: &reqwest::Client,
    config: &ScrapeConfig,
) -> Result<Discovered, TgnError> {
    let html = fetch::fetch_listing(client, &config.listing_url).await?;
    let rows = fetch::parse_listing(&html);
    let selected = fetch::select_links(&rows, config);
    info!(
        "Listing has {} rows; {} result documents between {} and {}",
        rows.len(),
        selected.len(),
        config.range.start,
        config.range.end
    );
    Ok(Discovered {
        listed: rows.len(),
        selected,
    })
}
