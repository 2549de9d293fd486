// src/pipeline/enrich.rs

//! Description enricher.
//!
//! Fills in full descriptions for listings whose search record only had a
//! summary, one detail page at a time with fixed-window pacing.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{CanonicalListing, EnrichmentConfig};
use crate::sources::{DetailFetcher, extractor_for};
use crate::utils::log;

pub use crate::sources::NOT_FOUND;

/// Description set when the detail page answered with a non-success status.
pub const FETCH_FAILED: &str = "Error fetching description.";
/// Description set for any other enrichment failure, including transport errors.
pub const PROCESSING_FAILED: &str = "Error processing description.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub eligible: usize,
    pub enriched: usize,
    pub failed: usize,
    pub short_pauses: usize,
    pub long_pauses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichProgress {
    pub done: usize,
    pub total: usize,
}

impl EnrichProgress {
    pub fn percent(&self) -> usize {
        log::percent(self.done, self.total)
    }
}

/// Whether a listing needs its description fetched from the detail page.
pub fn is_eligible(listing: &CanonicalListing) -> bool {
    listing.description.is_none()
        && listing.detail_url.is_some()
        && extractor_for(listing.source()).is_some()
}

/// Enrich eligible listings in place.
///
/// Per-listing failures leave a sentinel description and never abort the
/// run. Only cancellation stops it early.
pub async fn enrich(
    listings: &mut [CanonicalListing],
    fetcher: &dyn DetailFetcher,
    config: &EnrichmentConfig,
    cancel: &CancellationToken,
    mut progress: impl FnMut(EnrichProgress),
) -> Result<EnrichmentReport> {
    let eligible: Vec<usize> = listings
        .iter()
        .enumerate()
        .filter(|(_, listing)| is_eligible(listing))
        .map(|(index, _)| index)
        .collect();

    let total = eligible.len();
    let mut report = EnrichmentReport {
        eligible: total,
        ..Default::default()
    };
    if total == 0 {
        return Ok(report);
    }

    let batch_size = config.batch_size.max(1);
    let bulk_size = config.bulk_size.max(1);

    for (position, index) in eligible.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let listing = &mut listings[index];
        match describe(listing, fetcher).await {
            Ok(description) => {
                listing.description = Some(description);
                report.enriched += 1;
            }
            Err(e) => {
                log::warn(&format!(
                    "Could not enrich {}: {}",
                    listing.detail_url.as_deref().unwrap_or_default(),
                    e
                ));
                listing.description = Some(sentinel_for(&e).to_string());
                report.failed += 1;
            }
        }

        let done = position + 1;
        progress(EnrichProgress { done, total });
        if done % batch_size == 0 || done == total {
            log::progress(done, total, "Fetching descriptions");
        }

        if done == total {
            break;
        }
        if done % bulk_size == 0 {
            pause(Duration::from_millis(config.bulk_pause_ms), cancel).await?;
            report.long_pauses += 1;
        }
        if done % batch_size == 0 {
            pause(Duration::from_millis(config.batch_pause_ms), cancel).await?;
            report.short_pauses += 1;
        }
    }

    Ok(report)
}

async fn describe(listing: &CanonicalListing, fetcher: &dyn DetailFetcher) -> Result<String> {
    let url = listing
        .detail_url
        .as_deref()
        .ok_or_else(|| AppError::extraction("listing has no detail link"))?;
    let html = fetcher.fetch_detail_html(url).await?;

    let extractor = extractor_for(listing.source()).ok_or_else(|| {
        AppError::extraction(format!("no description extractor for {}", listing.source()))
    })?;
    extractor.extract(&html)
}

fn sentinel_for(err: &AppError) -> &'static str {
    match err {
        AppError::Status { .. } => FETCH_FAILED,
        AppError::Extraction(_) => NOT_FOUND,
        _ => PROCESSING_FAILED,
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
