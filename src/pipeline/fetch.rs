//! Document fetcher: find result PDFs on the listing page and download them.
//!
//! The listing page is a list of `views-row` blocks, each holding a display
//! date (`span.date-display-single`, Spanish month names) and a link to the
//! result document. Only links that look like BONOS TGN results (`BT` in the
//! href, `.pdf` suffix) inside the configured date range are kept.
//!
//! Downloads are stored as `BT_YYYY_MM_DD.pdf`, the same name the extraction
//! stage reads the auction date back from. Existing files are skipped unless
//! the config asks to overwrite, so re-running a scrape only fetches what is
//! new.

use crate::config::ScrapeConfig;
use crate::error::TgnError;
use crate::output::{AuctionLink, ScrapeStats};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

static RE_VIEWS_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div\b[^>]*\bclass\s*=\s*"(?:[^"]*\s)?views-row(?:\s[^"]*)?"[^>]*>"#).unwrap()
});

static RE_DATE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<span\b[^>]*\bclass\s*=\s*"(?:[^"]*\s)?date-display-single(?:\s[^"]*)?"[^>]*>(.*?)</span>"#,
    )
    .unwrap()
});

static RE_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#).unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static RE_SPANISH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{1,2})\s+(?:DE\s+)?([A-ZÁÉÍÓÚÑ]+)\s*,?\s+(?:DE\s+)?([0-9]{4})").unwrap()
});

/// One `views-row` block with both a date and a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// Visible date text, tags stripped.
    pub date_text: String,
    /// First `href` in the row, as written in the page.
    pub href: String,
}

// ── Listing parsing ──────────────────────────────────────────────────────────

/// Split a listing page into rows; rows lacking a date span or a link are dropped.
pub fn parse_listing(html: &str) -> Vec<ListingRow> {
    let starts: Vec<usize> = RE_VIEWS_ROW.find_iter(html).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            let block = &html[start..end];
            let date_text = RE_DATE_SPAN
                .captures(block)
                .map(|caps| html_text(&caps[1]))?;
            let href = RE_HREF.captures(block).map(|caps| caps[1].trim().to_string())?;
            Some(ListingRow { date_text, href })
        })
        .collect()
}

fn html_text(fragment: &str) -> String {
    let stripped = RE_TAG.replace_all(fragment, " ");
    stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a Spanish display date such as `15 Marzo, 2024` or `15 de marzo de 2024`.
pub fn parse_spanish_date(text: &str) -> Option<NaiveDate> {
    let upper = text.to_uppercase();
    let caps = RE_SPANISH_DATE.captures(&upper)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = spanish_month(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn spanish_month(name: &str) -> Option<u32> {
    let month = match name {
        "ENERO" => 1,
        "FEBRERO" => 2,
        "MARZO" => 3,
        "ABRIL" => 4,
        "MAYO" => 5,
        "JUNIO" => 6,
        "JULIO" => 7,
        "AGOSTO" => 8,
        "SEPTIEMBRE" | "SETIEMBRE" => 9,
        "OCTUBRE" => 10,
        "NOVIEMBRE" => 11,
        "DICIEMBRE" => 12,
        _ => return None,
    };
    Some(month)
}

/// Does this href point at a BONOS TGN result document?
pub fn is_result_document(href: &str) -> bool {
    href.contains("BT") && href.ends_with(".pdf")
}

/// Local file name for the document of an auction held on `date`.
pub fn document_filename(date: NaiveDate) -> String {
    format!("BT_{}.pdf", date.format("%Y_%m_%d"))
}

/// Keep rows that are result documents dated inside the configured range.
pub fn select_links(rows: &[ListingRow], config: &ScrapeConfig) -> Vec<AuctionLink> {
    rows.iter()
        .filter_map(|row| {
            let Some(date) = parse_spanish_date(&row.date_text) else {
                debug!("Unreadable listing date: {:?}", row.date_text);
                return None;
            };
            if !config.range.contains(date) || !is_result_document(&row.href) {
                return None;
            }
            match resolve_url(&config.document_base, &row.href) {
                Some(url) => Some(AuctionLink { date, url }),
                None => {
                    warn!("Cannot resolve document link {:?}", row.href);
                    None
                }
            }
        })
        .collect()
}

fn resolve_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = reqwest::Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

// ── Network ──────────────────────────────────────────────────────────────────

/// HTTP client shared by the listing request and every download.
pub fn build_client(config: &ScrapeConfig) -> Result<reqwest::Client, TgnError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| TgnError::Internal(format!("HTTP client: {}", e)))
}

/// Fetch the listing page HTML.
pub async fn fetch_listing(client: &reqwest::Client, url: &str) -> Result<String, TgnError> {
    info!("Fetching auction listing: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TgnError::ListingFetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(TgnError::ListingHttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| TgnError::ListingFetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Download one document into `path`, replacing any existing file atomically.
pub async fn download_document(
    client: &reqwest::Client,
    link: &AuctionLink,
    path: &Path,
    timeout_secs: u64,
) -> Result<(), TgnError> {
    let url = link.url.as_str();
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            TgnError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            TgnError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(TgnError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| TgnError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !bytes.starts_with(b"%PDF") {
        return Err(TgnError::DownloadFailed {
            url: url.to_string(),
            reason: "response is not a PDF".to_string(),
        });
    }

    let tmp_path = path.with_extension("pdf.part");
    tokio::fs::write(&tmp_path, &bytes)
        .await
        .map_err(|e| TgnError::OutputWriteFailed {
            path: tmp_path.clone(),
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

/// Download every link not already on disk. Individual failures are logged
/// and counted; only an unusable download directory aborts.
pub async fn download_documents(
    client: &reqwest::Client,
    links: &[AuctionLink],
    config: &ScrapeConfig,
) -> Result<ScrapeStats, TgnError> {
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .map_err(|e| TgnError::OutputWriteFailed {
            path: config.download_dir.clone(),
            source: e,
        })?;

    let mut stats = ScrapeStats {
        matched: links.len(),
        ..ScrapeStats::default()
    };

    for link in links {
        let path: PathBuf = config.download_dir.join(link.filename());

        if !config.overwrite && path.exists() {
            info!("Already downloaded: {}", link.filename());
            stats.already_present += 1;
            continue;
        }

        info!("Downloading {} from {}", link.filename(), link.url);
        match download_document(client, link, &path, config.download_timeout_secs).await {
            Ok(()) => stats.downloaded += 1,
            Err(e) => {
                warn!("Download failed for {}: {}", link.filename(), e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
