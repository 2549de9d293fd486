// src/sources/detail.rs

//! Detail page fetching and per-source description extraction.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html};

use super::{DescriptionExtractor, DetailFetcher, parse_selector};
use crate::error::{AppError, Result};
use crate::models::SourceId;
use crate::utils::http;

/// Description set when a detail page has no description element.
pub const NOT_FOUND: &str = "Description element not found on page.";

/// Fetches detail pages over HTTP.
pub struct HttpDetailFetcher {
    client: Client,
}

impl HttpDetailFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch_detail_html(&self, url: &str) -> Result<String> {
        http::fetch_text(&self.client, url).await
    }
}

/// domain.com.au listing description.
///
/// Prefers the expander content; otherwise takes the description block
/// without its heading and "read more" control.
pub struct DomainDescription;

impl DescriptionExtractor for DomainDescription {
    fn extract(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let block_sel = parse_selector("div[data-testid=\"listing-details__description\"]")?;
        let expander_sel = parse_selector(
            "div[data-testid=\"listing-details__description\"] .noscript-expander-content",
        )?;
        let skip_sel = parse_selector(".css-ldqj9h, h2.css-8shhfl")?;

        if let Some(expander) = document.select(&expander_sel).next() {
            let inner = expander.inner_html();
            if !inner.trim().is_empty() {
                return Ok(inner.trim().to_string());
            }
        }

        let block = document
            .select(&block_sel)
            .next()
            .ok_or_else(|| AppError::extraction(NOT_FOUND))?;

        let mut description = String::new();
        for child in block.children() {
            match ElementRef::wrap(child) {
                Some(el) if skip_sel.matches(&el) => {}
                Some(el) => description.push_str(&el.html()),
                None => {
                    if let Some(text) = child.value().as_text() {
                        description.push_str(text);
                    }
                }
            }
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::extraction(NOT_FOUND));
        }
        Ok(description.to_string())
    }
}

/// rent.com.au listing description paragraph, markup included.
pub struct RentDescription;

impl DescriptionExtractor for RentDescription {
    fn extract(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let selector = parse_selector("p.property-description-content")?;

        document
            .select(&selector)
            .next()
            .map(|el| el.html())
            .ok_or_else(|| AppError::extraction(NOT_FOUND))
    }
}

/// Extractor for sources whose search results lack full descriptions.
pub fn extractor_for(source: SourceId) -> Option<Box<dyn DescriptionExtractor>> {
    match source {
        SourceId::Domain => Some(Box::new(DomainDescription)),
        SourceId::Rent => Some(Box::new(RentDescription)),
        SourceId::RealEstate | SourceId::Flatmates => None,
    }
}
