//! Query engine over a completed search's listings.
//!
//! Filtering, sorting, and paging run entirely in memory against the
//! session's listings; no query here ever reaches an upstream site.

pub mod filter;
pub mod page;
pub mod price;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::CanonicalListing;

pub use filter::{available_categories, categories, default_exclusions, parse_terms};
pub use page::{PageWindow, window};
pub use price::{parse_price, sort_by_price};

/// Default number of listings per result page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(SortKey::None),
            "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            other => Err(AppError::validation(format!(
                "Unknown sort '{other}' (expected none, price-asc or price-desc)"
            ))),
        }
    }
}

/// Filter, sort, and paging choices for one view of the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Lowercase terms; a listing whose address contains any is removed
    pub address_exclude: Vec<String>,

    /// Lowercase terms; a listing whose description contains any is removed
    pub description_exclude: Vec<String>,

    /// Category labels to remove, matched exactly
    pub type_exclude: BTreeSet<String>,

    pub sort: SortKey,

    /// 1-based; clamped into range when applied
    pub page: usize,

    pub page_size: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            address_exclude: Vec::new(),
            description_exclude: Vec::new(),
            type_exclude: BTreeSet::new(),
            sort: SortKey::None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    /// Spec from raw comma-separated filter inputs.
    pub fn from_inputs(address: &str, description: &str) -> Self {
        Self {
            address_exclude: parse_terms(address),
            description_exclude: parse_terms(description),
            ..Self::default()
        }
    }
}

/// One page of the filtered, sorted listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub listings: Vec<CanonicalListing>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Listings left after filtering, across all pages
    pub total_count: usize,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Apply a query spec to a result set.
pub fn apply(listings: &[CanonicalListing], spec: &QuerySpec) -> ResultPage {
    let kept: Vec<&CanonicalListing> = listings
        .iter()
        .filter(|listing| filter::keep(listing, spec))
        .collect();
    let ordered = sort_by_price(kept, spec.sort);

    let window = window(ordered.len(), spec.page, spec.page_size);
    ResultPage {
        listings: ordered[window.range.clone()]
            .iter()
            .map(|listing| (*listing).clone())
            .collect(),
        current_page: window.current_page,
        total_pages: window.total_pages,
        total_count: ordered.len(),
    }
}
