// src/sources/realestate.rs

//! realestate.com.au adapter over the public GraphQL search endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};

use super::{SourceAdapter, feature};
use crate::error::{AppError, Result};
use crate::models::{
    Address, Agency, CanonicalListing, ImageRef, Inspection, Lister, PageSignal, RawPage,
    RawRecord, SearchForm, SourceId, SourcesConfig,
};
use crate::utils::{http, resolve};

const FLAGS: &[&str] = &["surroundingSuburbs", "furnished", "petsAllowed"];

const SEARCH_QUERY: &str = r#"query searchByQuery($query: String!) {
  rentSearch(query: $query) {
    results {
      exact {
        items {
          listing {
            ... on ResidentialListing {
              id
              description
              address { suburb display { shortAddress fullAddress } }
              price { display }
              propertyType { display }
              availableDate { display }
              bond { display }
              media { mainImage { templatedUrl } images { templatedUrl } }
              generalFeatures {
                bedrooms { value }
                bathrooms { value }
                parkingSpaces { value }
                studies { value }
              }
              listingCompany { name media { logo { templatedUrl } } }
              listers { name phoneNumber { display } }
              inspections { startTime endTime display { shortLabel } }
              _links { canonical { href } }
            }
          }
        }
      }
      pagination { maxPageNumberAvailable }
    }
  }
}"#;

pub struct RealEstateAdapter {
    client: Client,
    endpoint: String,
    site_url: String,
    page_size: u32,
}

impl RealEstateAdapter {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            endpoint: config.realestate_url.clone(),
            site_url: config.realestate_site_url.trim_end_matches('/').to_string(),
            page_size: config.realestate_page_size,
        }
    }

    /// GraphQL request body for one page of the search.
    fn request_body(&self, form: &SearchForm, page: u32) -> Result<Value> {
        let variables = search_variables(form, page, self.page_size);
        Ok(json!({
            "operationName": "searchByQuery",
            "variables": { "query": serde_json::to_string(&variables)? },
            "query": SEARCH_QUERY,
        }))
    }
}

#[async_trait]
impl SourceAdapter for RealEstateAdapter {
    fn source(&self) -> SourceId {
        SourceId::RealEstate
    }

    fn boolean_flags(&self) -> &'static [&'static str] {
        FLAGS
    }

    fn validate_form(&self, form: &SearchForm) -> Result<()> {
        if form.has("location") {
            Ok(())
        } else {
            Err(AppError::validation("A location is required for realestate.com.au"))
        }
    }

    async fn fetch_page(&self, form: &SearchForm, page: u32) -> Result<RawPage> {
        let body = self.request_body(&self.page_form(form, page), page)?;
        log::debug!("Fetching realestate page {}", page);

        let response: Value = http::post_json(&self.client, &self.endpoint, &body).await?;
        parse_response(&response)
    }

    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing> {
        if !record.value().is_object() {
            return None;
        }

        let mut listing = CanonicalListing::new(SourceId::RealEstate);
        listing.id = record.str_at("id");
        listing.address = address(record);
        listing.price = record.str_at("price.display");
        listing.property_type = record.str_at("propertyType.display");
        listing.description = record.str_at("description");
        listing.detail_url = record
            .str_at("_links.canonical.href")
            .and_then(|href| resolve(&self.site_url, &href));
        listing.available_date = record.str_at("availableDate.display");
        listing.bond = record.str_at("bond.display");

        listing.images = record
            .array_at("media.images")
            .iter()
            .filter_map(|image| image.get("templatedUrl").and_then(Value::as_str))
            .map(ImageRef::from_url)
            .collect();
        if listing.images.is_empty() {
            listing.images.extend(
                record
                    .str_at("media.mainImage.templatedUrl")
                    .map(ImageRef::from_url),
            );
        }

        let studies = record
            .str_at("generalFeatures.studies.value")
            .filter(|n| n.parse::<f64>().is_ok_and(|n| n > 0.0));
        listing.features = [
            feature("Beds", record.str_at("generalFeatures.bedrooms.value")),
            feature("Baths", record.str_at("generalFeatures.bathrooms.value")),
            feature("Parking", record.str_at("generalFeatures.parkingSpaces.value")),
            feature("Studies", studies),
            feature("Type", listing.property_type.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        listing.agency = record.str_at("listingCompany.name").map(|name| Agency {
            name,
            logo: record
                .str_at("listingCompany.media.logo.templatedUrl")
                .map(ImageRef::from_url),
            listers: record.array_at("listers").iter().filter_map(lister).collect(),
        });

        listing.inspection_times = record
            .array_at("inspections")
            .iter()
            .map(|slot| {
                let record = RawRecord::new(slot.clone());
                Inspection {
                    starts_at: record.str_at("startTime"),
                    ends_at: record.str_at("endTime"),
                    label: record.str_at("display.shortLabel"),
                }
            })
            .collect();

        Some(listing)
    }
}

/// The JSON-encoded `query` variable the search endpoint expects.
fn search_variables(form: &SearchForm, page: u32, page_size: u32) -> Value {
    let mut filters = Map::new();
    for flag in FLAGS {
        filters.insert(flag.to_string(), Value::Bool(form.flag(flag)));
    }

    let range = |min_key: &str, max_key: &str| {
        let mut range = Map::new();
        if let Some(min) = form.get(min_key) {
            range.insert("minimum".into(), min.into());
        }
        if let Some(max) = form.get(max_key) {
            range.insert("maximum".into(), max.into());
        }
        (!range.is_empty()).then_some(Value::Object(range))
    };
    if let Some(price) = range("minPrice", "maxPrice") {
        filters.insert("priceRange".into(), price);
    }
    if let Some(bedrooms) = range("minBedrooms", "maxBedrooms") {
        filters.insert("bedroomsRange".into(), bedrooms);
    }

    let property_types: Vec<&str> = form
        .pairs()
        .filter(|(key, _)| *key == "propertyTypes")
        .map(|(_, value)| value)
        .collect();
    if !property_types.is_empty() {
        filters.insert("propertyTypes".into(), json!(property_types));
    }

    json!({
        "channel": "rent",
        "page": page,
        "pageSize": page_size,
        "localities": [{ "searchLocation": form.get("location").unwrap_or_default() }],
        "filters": filters,
    })
}

fn parse_response(body: &Value) -> Result<RawPage> {
    let errors = body
        .get("errors")
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty());
    if let Some(errors) = errors {
        let messages: Vec<&str> = errors
            .iter()
            .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
            .collect();
        return Err(AppError::upstream(
            SourceId::RealEstate,
            format!("API Error: {}", messages.join(", ")),
        ));
    }

    let results = body
        .pointer("/data/rentSearch/results")
        .ok_or_else(|| AppError::upstream(SourceId::RealEstate, "response has no search results"))?;

    let records: Vec<RawRecord> = results
        .pointer("/exact/items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("listing").filter(|l| !l.is_null()))
                .cloned()
                .map(RawRecord::new)
                .collect()
        })
        .unwrap_or_default();

    let max_page = results
        .pointer("/pagination/maxPageNumberAvailable")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Ok(RawPage::new(
        records,
        PageSignal::TotalPages(u32::try_from(max_page).unwrap_or(u32::MAX)),
    ))
}

fn address(record: &RawRecord) -> Option<Address> {
    let short = record.str_at("address.display.shortAddress");
    let full = record
        .str_at("address.display.fullAddress")
        .or_else(|| short.clone())?;
    Some(Address {
        full,
        short,
        suburb: record.str_at("address.suburb"),
    })
}

fn lister(value: &Value) -> Option<Lister> {
    let record = RawRecord::new(value.clone());
    Some(Lister {
        name: record.str_at("name")?,
        phone: record.str_at("phoneNumber.display"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> RealEstateAdapter {
        RealEstateAdapter::new(Client::new(), &SourcesConfig::default())
    }

    #[test]
    fn test_graphql_errors_surface_as_upstream() {
        let body = json!({
            "errors": [{ "message": "bad query" }, { "message": "rate limited" }]
        });
        let err = parse_response(&body).unwrap_err();
        assert_eq!(
            err.to_string(),
            "realestate error: API Error: bad query, rate limited"
        );
    }

    #[test]
    fn test_parse_response_items_and_pages() {
        let body = json!({
            "data": { "rentSearch": { "results": {
                "exact": { "items": [
                    { "listing": { "id": "1", "price": { "display": "$600 per week" } } },
                    { "listing": null },
                    { "listing": { "id": "2" } }
                ] },
                "pagination": { "maxPageNumberAvailable": 4 }
            } } }
        });

        let page = parse_response(&body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.signal, PageSignal::TotalPages(4));
        assert!(!page.exhausted(3));
        assert!(page.exhausted(4));
    }

    #[test]
    fn test_request_body_encodes_query_variable() {
        let form = SearchForm::from_pairs([
            ("location", "Newtown, NSW 2042"),
            ("furnished", "on"),
            ("maxPrice", "700"),
            ("propertyTypes", "unit"),
            ("propertyTypes", "house"),
        ]);
        let body = adapter()
            .request_body(&adapter().page_form(&form, 2), 2)
            .unwrap();

        assert_eq!(body["operationName"], "searchByQuery");
        let query: Value =
            serde_json::from_str(body["variables"]["query"].as_str().unwrap()).unwrap();
        assert_eq!(query["page"], 2);
        assert_eq!(query["pageSize"], 25);
        assert_eq!(query["localities"][0]["searchLocation"], "Newtown, NSW 2042");
        assert_eq!(query["filters"]["furnished"], true);
        assert_eq!(query["filters"]["petsAllowed"], false);
        assert_eq!(query["filters"]["priceRange"]["maximum"], "700");
        assert_eq!(query["filters"]["propertyTypes"], json!(["unit", "house"]));
    }

    #[test]
    fn test_location_required() {
        assert!(adapter().validate_form(&SearchForm::new()).is_err());
    }

    #[test]
    fn test_normalize_listing() {
        let record = RawRecord::new(json!({
            "id": "143990000",
            "description": "Renovated two bedroom unit.\nClose to transport.",
            "address": { "suburb": "Newtown", "display": { "shortAddress": "4/20 King St", "fullAddress": "4/20 King St, Newtown, NSW 2042" } },
            "price": { "display": "$650 per week" },
            "propertyType": { "display": "Apartment" },
            "bond": { "display": "$2,600" },
            "media": { "images": [{ "templatedUrl": "https://i2.au.reastatic.net/{size}/abc/image.jpg" }] },
            "generalFeatures": { "bedrooms": { "value": 2 }, "bathrooms": { "value": 1 }, "parkingSpaces": { "value": 1 }, "studies": { "value": 0 } },
            "listingCompany": { "name": "Ray White Newtown", "media": { "logo": { "templatedUrl": "https://i2.au.reastatic.net/{size}/logo.png" } } },
            "listers": [{ "name": "Sam Lee", "phoneNumber": { "display": "0400 000 000" } }, { "phoneNumber": { "display": "n/a" } }],
            "inspections": [{ "startTime": "2025-04-12T10:00:00+10:00", "endTime": "2025-04-12T10:15:00+10:00" }],
            "_links": { "canonical": { "href": "/property-unit-nsw-newtown-143990000" } }
        }));

        let listing = adapter().normalize(&record).unwrap();
        assert_eq!(listing.id.as_deref(), Some("143990000"));
        assert_eq!(
            listing.detail_url.as_deref(),
            Some("https://www.realestate.com.au/property-unit-nsw-newtown-143990000")
        );
        assert_eq!(
            listing.features,
            vec!["Beds: 2", "Baths: 1", "Parking: 1", "Type: Apartment"]
        );
        assert!(matches!(listing.images[0], ImageRef::Templated(_)));
        assert_eq!(
            listing.images[0].resolve("640x480"),
            "https://i2.au.reastatic.net/640x480/abc/image.jpg"
        );

        let agency = listing.agency.unwrap();
        assert_eq!(agency.name, "Ray White Newtown");
        assert_eq!(agency.listers.len(), 1);
        assert_eq!(agency.listers[0].phone.as_deref(), Some("0400 000 000"));

        assert_eq!(
            listing.inspection_times[0].display(),
            "Sat, 12 Apr 2025, 10:00 AM - 10:15 AM"
        );
        assert!(listing.description.unwrap().starts_with("Renovated"));
    }
}
