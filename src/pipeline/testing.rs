// src/pipeline/testing.rs

//! In-memory adapters and fetchers for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{
    Address, CanonicalListing, PageSignal, RawPage, RawRecord, SearchForm, SourceId,
};
use crate::sources::{DetailFetcher, SourceAdapter};

pub fn record(address: &str) -> RawRecord {
    RawRecord::new(json!({ "address": address }))
}

pub fn priced(address: &str, price: &str) -> RawRecord {
    RawRecord::new(json!({ "address": address, "price": price }))
}

pub fn domain_listing(i: usize) -> CanonicalListing {
    let mut listing = CanonicalListing::new(SourceId::Domain);
    listing.address = Some(Address::line(format!("{i} Test St, Newtown NSW 2042")));
    listing.detail_url = Some(format!("https://www.domain.com.au/listing-{i}"));
    listing
}

/// Serves canned pages in order; pages past the end are empty.
pub struct FakeAdapter {
    source: SourceId,
    pages: Vec<RawPage>,
    repeat: Option<RawPage>,
    fail_at: Option<u32>,
    requested: Mutex<Vec<u32>>,
}

impl FakeAdapter {
    pub fn new(pages: Vec<RawPage>) -> Self {
        Self {
            source: SourceId::Domain,
            pages,
            repeat: None,
            fail_at: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Serves the same page forever.
    pub fn repeating(page: RawPage) -> Self {
        Self {
            repeat: Some(page),
            ..Self::new(Vec::new())
        }
    }

    pub fn failing_at(mut self, page: u32) -> Self {
        self.fail_at = Some(page);
        self
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = source;
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn source(&self) -> SourceId {
        self.source
    }

    async fn fetch_page(&self, _form: &SearchForm, page: u32) -> Result<RawPage> {
        self.requested.lock().unwrap().push(page);
        if self.fail_at == Some(page) {
            return Err(AppError::Status {
                url: format!("https://upstream.test/page/{page}"),
                status: 503,
            });
        }
        if let Some(repeat) = &self.repeat {
            return Ok(repeat.clone());
        }
        Ok(self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_else(|| RawPage::new(Vec::new(), PageSignal::HasNext(false))))
    }

    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing> {
        if !record.value().is_object() {
            return None;
        }
        let mut listing = CanonicalListing::new(self.source);
        listing.address = record.str_at("address").map(Address::line);
        listing.price = record.str_at("price");
        listing.detail_url = record.str_at("url");
        listing.description = record.str_at("description");
        Some(listing)
    }
}

/// Detail pages keyed by URL; unknown URLs answer 404.
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(pages: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailFetcher for FakeFetcher {
    async fn fetch_detail_html(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| AppError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}
