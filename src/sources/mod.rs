//! Source adapters for the upstream rental sites.
//!
//! Each adapter owns everything specific to its site: request construction,
//! response parsing, and projection of its records onto
//! [`CanonicalListing`]. The pipeline only sees the [`SourceAdapter`]
//! contract, selected once per search with [`adapter_for`].
//!
//! - `DomainAdapter`: JSON page API
//! - `RentAdapter`: server-rendered HTML
//! - `RealEstateAdapter`: GraphQL
//! - `FlatmatesAdapter`: JSON search API

mod detail;
mod domain;
mod flatmates;
mod realestate;
mod rent;

use async_trait::async_trait;
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::{CanonicalListing, RawPage, RawRecord, SearchForm, SourceId, SourcesConfig};

pub use detail::{
    DomainDescription, HttpDetailFetcher, NOT_FOUND, RentDescription, extractor_for,
};
pub use domain::DomainAdapter;
pub use flatmates::FlatmatesAdapter;
pub use realestate::RealEstateAdapter;
pub use rent::RentAdapter;

/// Contract between the pipeline and one upstream site.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Site this adapter talks to.
    fn source(&self) -> SourceId;

    /// Checkbox fields the upstream expects explicitly, even when unchecked.
    fn boolean_flags(&self) -> &'static [&'static str] {
        &[]
    }

    /// Reject forms missing fields the upstream cannot do without.
    fn validate_form(&self, _form: &SearchForm) -> Result<()> {
        Ok(())
    }

    /// Fetch one page (1-based) of raw records.
    async fn fetch_page(&self, form: &SearchForm, page: u32) -> Result<RawPage>;

    /// Project a raw record onto the canonical schema.
    ///
    /// Returns `None` when the record does not have the expected shape.
    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing>;

    /// The form as sent for `page`, with flag defaults applied.
    fn page_form(&self, form: &SearchForm, page: u32) -> SearchForm {
        form.with_flag_defaults(self.boolean_flags()).with_page(page)
    }
}

/// Fetches detail pages for description enrichment.
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_detail_html(&self, url: &str) -> Result<String>;
}

/// Pulls the description fragment out of a source's detail page.
pub trait DescriptionExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<String>;
}

/// Build the adapter for a source.
pub fn adapter_for(
    source: SourceId,
    client: reqwest::Client,
    config: &SourcesConfig,
) -> Box<dyn SourceAdapter> {
    match source {
        SourceId::Domain => Box::new(DomainAdapter::new(client, config)),
        SourceId::Rent => Box::new(RentAdapter::new(client, config)),
        SourceId::RealEstate => Box::new(RealEstateAdapter::new(client, config)),
        SourceId::Flatmates => Box::new(FlatmatesAdapter::new(client, config)),
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// `"Label: value"` feature line when the value is present.
pub(crate) fn feature(label: &str, value: Option<String>) -> Option<String> {
    value.map(|v| format!("{label}: {v}"))
}
