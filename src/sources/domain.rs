// src/sources/domain.rs

//! domain.com.au adapter.
//!
//! The rent search page answers with its page-props JSON when asked for
//! `application/json`. Listings live in `props.listingsMap`, ordered by
//! `props.listingSearchResultIds`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{SourceAdapter, feature};
use crate::error::{AppError, Result};
use crate::models::{
    Address, CanonicalListing, ImageRef, Inspection, PageSignal, RawPage, RawRecord, SearchForm,
    SourceId, SourcesConfig,
};
use crate::utils::{http, resolve};

pub struct DomainAdapter {
    client: Client,
    base_url: String,
}

impl DomainAdapter {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            base_url: config.domain_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, form: &SearchForm) -> String {
        format!("{}/rent/?{}", self.base_url, form.to_query_string())
    }
}

#[async_trait]
impl SourceAdapter for DomainAdapter {
    fn source(&self) -> SourceId {
        SourceId::Domain
    }

    async fn fetch_page(&self, form: &SearchForm, page: u32) -> Result<RawPage> {
        let url = self.search_url(&self.page_form(form, page));
        log::debug!("Fetching domain page {}: {}", page, url);

        let body: Value = http::get_json(&self.client, &url).await?;
        parse_search_page(&body)
    }

    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing> {
        if !record.value().is_object() {
            return None;
        }

        let mut listing = CanonicalListing::new(SourceId::Domain);
        listing.id = record.str_at("id");
        listing.address = address(record);
        listing.price = record.str_at("price");
        listing.property_type = record.str_at("features.propertyTypeFormatted");
        listing.headline = record.str_at("headline");
        listing.detail_url = record
            .str_at("url")
            .and_then(|href| resolve(&self.base_url, &href));
        listing.images = record
            .array_at("images")
            .iter()
            .filter_map(image_url)
            .map(ImageRef::from_url)
            .collect();

        let parking = record
            .str_at("features.parking.total")
            .filter(|total| total.parse::<f64>().is_ok_and(|n| n > 0.0));
        listing.features = [
            feature("Beds", record.str_at("features.beds")),
            feature("Baths", record.str_at("features.baths")),
            feature("Parking", parking),
            feature("Type", listing.property_type.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        if let Some(open) = record.str_at("inspection.openTime") {
            listing.inspection_times.push(Inspection {
                starts_at: Some(open),
                ends_at: record.str_at("inspection.closeTime"),
                label: None,
            });
        }

        Some(listing)
    }
}

/// Split a search response into ordered raw records.
fn parse_search_page(body: &Value) -> Result<RawPage> {
    let props = body
        .get("props")
        .ok_or_else(|| AppError::upstream(SourceId::Domain, "response has no page props"))?;

    let total_pages = props
        .pointer("/pageViewMetadata/searchResponse/SearchResults/totalPages")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let signal = PageSignal::TotalPages(u32::try_from(total_pages).unwrap_or(u32::MAX));

    let Some(listings) = props.get("listingsMap").and_then(Value::as_object) else {
        return Ok(RawPage::new(Vec::new(), signal));
    };

    let ids: Vec<String> = match props.get("listingSearchResultIds").and_then(Value::as_array) {
        Some(ids) => ids.iter().filter_map(id_text).collect(),
        None => listings.keys().cloned().collect(),
    };

    let records: Vec<RawRecord> = ids
        .iter()
        .filter_map(|id| {
            let mut model = listings.get(id)?.get("listingModel")?.clone();
            if let Value::Object(fields) = &mut model {
                fields
                    .entry("id")
                    .or_insert_with(|| Value::String(id.clone()));
            }
            Some(RawRecord::new(model))
        })
        .collect();

    Ok(RawPage::new(records, signal))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(fields) => fields.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Address is either a flat string or `{street, suburb, state, postcode}`.
fn address(record: &RawRecord) -> Option<Address> {
    if let Some(Value::String(line)) = record.at("address") {
        let line = line.trim();
        return (!line.is_empty()).then(|| Address::line(line));
    }

    let street = record.str_at("address.street");
    let suburb = record.str_at("address.suburb");
    let locality = [
        suburb.clone(),
        record.str_at("address.state"),
        record.str_at("address.postcode"),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    let full = match (&street, locality.is_empty()) {
        (Some(street), false) => format!("{street}, {locality}"),
        (Some(street), true) => street.clone(),
        (None, false) => locality,
        (None, true) => return None,
    };

    Some(Address {
        full,
        short: street,
        suburb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> DomainAdapter {
        DomainAdapter::new(Client::new(), &SourcesConfig::default())
    }

    fn sample_response() -> Value {
        json!({
            "props": {
                "listingSearchResultIds": [202, 101],
                "listingsMap": {
                    "101": { "listingModel": { "url": "/1-a-st-newtown-nsw-2042-101", "price": "$500 pw" } },
                    "202": { "listingModel": { "url": "/2-b-st-newtown-nsw-2042-202", "price": "$450 pw" } }
                },
                "pageViewMetadata": {
                    "searchResponse": { "SearchResults": { "totalPages": 3, "page": 1 } }
                }
            }
        })
    }

    #[test]
    fn test_records_follow_result_id_order() {
        let page = parse_search_page(&sample_response()).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].str_at("id").as_deref(), Some("202"));
        assert_eq!(page.records[1].str_at("price").as_deref(), Some("$500 pw"));
        assert_eq!(page.signal, PageSignal::TotalPages(3));
        assert!(!page.exhausted(2));
    }

    #[test]
    fn test_missing_props_is_upstream_error() {
        let err = parse_search_page(&json!({ "error": "blocked" })).unwrap_err();
        assert!(matches!(err, AppError::Upstream { origin: SourceId::Domain, .. }));
    }

    #[test]
    fn test_missing_listings_is_empty_page() {
        let page = parse_search_page(&json!({ "props": {} })).unwrap();
        assert!(page.records.is_empty());
        assert!(page.exhausted(1));
    }

    #[test]
    fn test_normalize_listing_model() {
        let record = RawRecord::new(json!({
            "id": "2019",
            "url": "/12-main-st-newtown-nsw-2042-2019",
            "price": "$650 per week",
            "address": { "street": "12 Main St", "suburb": "NEWTOWN", "state": "NSW", "postcode": "2042" },
            "features": { "beds": 2, "baths": 1, "parking": { "total": 0 }, "propertyTypeFormatted": "Apartment / Unit / Flat" },
            "images": ["https://bucket.example.com/a.jpg", { "url": "https://bucket.example.com/b.jpg" }],
            "inspection": { "openTime": "2025-04-12T10:00:00", "closeTime": "2025-04-12T10:15:00" }
        }));

        let listing = adapter().normalize(&record).unwrap();
        assert_eq!(listing.source(), SourceId::Domain);
        assert_eq!(
            listing.detail_url.as_deref(),
            Some("https://www.domain.com.au/12-main-st-newtown-nsw-2042-2019")
        );
        let address = listing.address.unwrap();
        assert_eq!(address.full, "12 Main St, NEWTOWN NSW 2042");
        assert_eq!(address.suburb.as_deref(), Some("NEWTOWN"));
        assert_eq!(
            listing.features,
            vec!["Beds: 2", "Baths: 1", "Type: Apartment / Unit / Flat"]
        );
        assert_eq!(listing.images.len(), 2);
        assert_eq!(listing.inspection_times.len(), 1);
        assert!(listing.description.is_none());
    }

    #[test]
    fn test_normalize_rejects_non_object() {
        assert!(adapter().normalize(&RawRecord::new(json!("oops"))).is_none());
    }
}
