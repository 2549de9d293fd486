// src/pipeline/paginate.rs

//! Pagination driver.
//!
//! Requests pages 1, 2, 3, ... from one adapter, strictly one at a time,
//! until the source reports exhaustion, a page comes back empty, or the
//! page limit is reached.

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{RawRecord, SearchForm};
use crate::sources::SourceAdapter;

/// Records accumulated across every fetched page, in page order.
#[derive(Debug, Clone, Default)]
pub struct PaginationOutcome {
    pub records: Vec<RawRecord>,
    pub pages_fetched: u32,
    /// Stopped at the page limit while the source still reported more pages
    pub hit_safety_bound: bool,
}

/// Fetch every page of a search.
///
/// An adapter error aborts the whole search; records from earlier pages
/// are discarded with it.
pub async fn paginate(
    adapter: &dyn SourceAdapter,
    form: &SearchForm,
    max_pages: u32,
    cancel: &CancellationToken,
) -> Result<PaginationOutcome> {
    let mut outcome = PaginationOutcome::default();
    let mut page = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        log::debug!("Requesting {} page {}", adapter.source(), page);
        let fetched = adapter.fetch_page(form, page).await?;
        outcome.pages_fetched = page;

        if fetched.records.is_empty() {
            log::debug!("{} page {} is empty; stopping", adapter.source(), page);
            break;
        }

        let exhausted = fetched.exhausted(page);
        outcome.records.extend(fetched.records);

        if exhausted {
            break;
        }
        if page >= max_pages {
            log::warn!(
                "Reached the {} page limit for {}; results may be incomplete",
                max_pages,
                adapter.source()
            );
            outcome.hit_safety_bound = true;
            break;
        }
        page += 1;
    }

    Ok(outcome)
}
