// src/sources/flatmates.rs

//! flatmates.com.au adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};

use super::{SourceAdapter, feature};
use crate::error::Result;
use crate::models::{
    Address, CanonicalListing, ImageRef, PageSignal, RawPage, RawRecord, SearchForm, SourceId,
    SourcesConfig, is_truthy,
};
use crate::utils::{http, resolve};

const FLAGS: &[&str] = &[
    "billsIncluded",
    "pets",
    "smokers",
    "shareHouses",
    "wholeProperties",
    "studios",
    "grannyFlats",
];

pub struct FlatmatesAdapter {
    client: Client,
    base_url: String,
}

impl FlatmatesAdapter {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            base_url: config.flatmates_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search/list", self.base_url)
    }
}

#[async_trait]
impl SourceAdapter for FlatmatesAdapter {
    fn source(&self) -> SourceId {
        SourceId::Flatmates
    }

    fn boolean_flags(&self) -> &'static [&'static str] {
        FLAGS
    }

    async fn fetch_page(&self, form: &SearchForm, page: u32) -> Result<RawPage> {
        let body = search_body(&self.page_form(form, page), page);
        log::debug!("Fetching flatmates page {}", page);

        let response: Value = http::post_json(&self.client, &self.search_url(), &body).await?;
        Ok(parse_response(&response))
    }

    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing> {
        if !record.value().is_object() {
            return None;
        }

        let mut listing = CanonicalListing::new(SourceId::Flatmates);
        listing.id = record.str_at("id");
        listing.address = record.str_at("location").map(Address::line);
        listing.price = record.str_at("rent");
        listing.bills_included = record.bool_at("bills_included");
        listing.headline = record.str_at("head");
        listing.description = record.str_at("description");
        listing.rooms = record.str_at("rooms");
        listing.detail_url = record
            .str_at("link")
            .and_then(|href| resolve(&self.base_url, &href));
        listing.images = record
            .array_at("photos")
            .iter()
            .filter_map(|photo| match photo {
                Value::String(url) => Some(url.as_str()),
                other => other.get("url").and_then(Value::as_str),
            })
            .map(ImageRef::from_url)
            .collect();

        listing.features = [
            feature("Beds", record.str_at("bedrooms")),
            feature("Baths", record.str_at("bathrooms")),
            feature("Occupants", record.str_at("occupants")),
            feature("Rooms", listing.rooms.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        Some(listing)
    }
}

/// Search request: form fields under `search`, declared flags as booleans.
fn search_body(form: &SearchForm, page: u32) -> Value {
    let mut search = Map::new();
    for (key, value) in form.pairs() {
        if key == "page" {
            continue;
        }
        let value = if FLAGS.contains(&key) {
            Value::Bool(form.flag(key))
        } else {
            Value::String(value.to_string())
        };
        search.insert(key.to_string(), value);
    }
    json!({ "search": search, "page": page })
}

fn parse_response(body: &Value) -> RawPage {
    let records: Vec<RawRecord> = body
        .get("matches")
        .and_then(Value::as_array)
        .map(|matches| matches.iter().cloned().map(RawRecord::new).collect())
        .unwrap_or_default();
    let has_next = body.get("nextPage").is_some_and(is_truthy);
    RawPage::new(records, PageSignal::HasNext(has_next))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> FlatmatesAdapter {
        FlatmatesAdapter::new(Client::new(), &SourcesConfig::default())
    }

    #[test]
    fn test_search_body_fills_flags() {
        let form = SearchForm::from_pairs([("location", "newtown"), ("pets", "on")]);
        let body = search_body(&adapter().page_form(&form, 2), 2);

        assert_eq!(body["page"], 2);
        assert_eq!(body["search"]["location"], "newtown");
        assert_eq!(body["search"]["pets"], true);
        assert_eq!(body["search"]["smokers"], false);
        assert_eq!(body["search"]["grannyFlats"], false);
        assert!(body["search"].get("page").is_none());
    }

    #[test]
    fn test_next_page_truthiness() {
        let more = parse_response(&json!({ "matches": [{ "id": 1 }], "nextPage": 3 }));
        assert!(!more.exhausted(2));

        let last = parse_response(&json!({ "matches": [{ "id": 1 }], "nextPage": null }));
        assert!(last.exhausted(2));

        let empty = parse_response(&json!({}));
        assert!(empty.records.is_empty());
        assert!(empty.exhausted(1));
    }

    #[test]
    fn test_normalize_match() {
        let record = RawRecord::new(json!({
            "id": 88123,
            "head": "Sunny room in Newtown share house",
            "location": "Newtown, Sydney",
            "link": "/share-house-sydney-newtown-2042-P88123",
            "rent": "$320 / week",
            "bills_included": true,
            "photos": ["https://cdn.flatmates.com.au/a.jpg"],
            "bedrooms": 3,
            "bathrooms": 1,
            "occupants": 2,
            "rooms": "Room in a Share House"
        }));

        let listing = adapter().normalize(&record).unwrap();
        assert_eq!(listing.id.as_deref(), Some("88123"));
        assert_eq!(
            listing.detail_url.as_deref(),
            Some("https://flatmates.com.au/share-house-sydney-newtown-2042-P88123")
        );
        assert_eq!(listing.display_price(), "$320 / week (bills incl.)");
        assert_eq!(listing.rooms.as_deref(), Some("Room in a Share House"));
        assert_eq!(
            listing.features,
            vec!["Beds: 3", "Baths: 1", "Occupants: 2", "Rooms: Room in a Share House"]
        );
        assert_eq!(
            listing.display_description(),
            Some("Sunny room in Newtown share house")
        );
    }
}
