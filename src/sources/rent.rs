// src/sources/rent.rs

//! rent.com.au adapter.
//!
//! Results are only available as server-rendered HTML, so each
//! `article.property-cell` is scraped into a small JSON record.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html};
use serde_json::{Value, json};
use url::Url;

use super::{SourceAdapter, parse_selector};
use crate::error::{AppError, Result};
use crate::models::{
    Address, CanonicalListing, ImageRef, PageSignal, RawPage, RawRecord, SearchForm, SourceId,
    SourcesConfig,
};
use crate::utils::{http, resolve};

/// Form field embedded in the request path.
const SUBURBS_FIELD: &str = "suburbs";

pub struct RentAdapter {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl RentAdapter {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            base_url: config.rent_url.trim_end_matches('/').to_string(),
            page_size: config.rent_page_size,
        }
    }

    /// `{base}/properties/{suburbs}/p{page}?{rest}`
    fn search_url(&self, form: &SearchForm, page: u32) -> Result<String> {
        let suburbs = form
            .get(SUBURBS_FIELD)
            .ok_or_else(|| AppError::validation("Suburbs are required for rent.com.au"))?;

        let page_segment = format!("p{page}");
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["properties", suburbs, page_segment.as_str()]);

        let mut rest = form.clone();
        rest.remove(SUBURBS_FIELD);
        rest.remove("page");
        let query = rest.to_query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl SourceAdapter for RentAdapter {
    fn source(&self) -> SourceId {
        SourceId::Rent
    }

    fn validate_form(&self, form: &SearchForm) -> Result<()> {
        if form.has(SUBURBS_FIELD) {
            Ok(())
        } else {
            Err(AppError::validation("Suburbs are required for rent.com.au"))
        }
    }

    async fn fetch_page(&self, form: &SearchForm, page: u32) -> Result<RawPage> {
        let url = self.search_url(&self.page_form(form, page), page)?;
        log::debug!("Fetching rent page {}: {}", page, url);

        let html = http::fetch_text(&self.client, &url).await?;
        let parsed = parse_results_page(&html)?;
        let signal = page_signal(&parsed, page, self.page_size);
        Ok(RawPage::new(parsed.records, signal))
    }

    fn normalize(&self, record: &RawRecord) -> Option<CanonicalListing> {
        if !record.value().is_object() {
            return None;
        }

        let mut listing = CanonicalListing::new(SourceId::Rent);
        listing.address = record.str_at("address").map(Address::line);
        listing.price = record.str_at("price");
        listing.property_type = record.str_at("propType");
        listing.headline = record.str_at("description");
        listing.detail_url = record
            .str_at("url")
            .and_then(|href| resolve(&self.base_url, &href));
        listing.images = record
            .str_at("imageUrl")
            .map(ImageRef::from_url)
            .into_iter()
            .collect();
        listing.features = record
            .array_at("features")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        if let Some(kind) = &listing.property_type {
            listing.features.push(format!("Type: {kind}"));
        }
        Some(listing)
    }
}

/// What one results page yields.
#[derive(Debug)]
struct ResultsPage {
    records: Vec<RawRecord>,
    total_listings: u64,
    next_page: Option<u32>,
}

fn parse_results_page(html: &str) -> Result<ResultsPage> {
    let document = Html::parse_document(html);

    let total_sel = parse_selector("div.listings h1.text-heading strong")?;
    let next_sel = parse_selector(".listings .ui-pagination li.pge:last-child a[rel=\"next\"]")?;
    let cell_sel = parse_selector("article.property-cell")?;

    let total_listings = document
        .select(&total_sel)
        .next()
        .map(|el| digits(&el.text().collect::<String>()))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    // Pagination links end in `/p{n}`.
    let next_page = document
        .select(&next_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| href.rsplit('/').next())
        .and_then(|last| last.split('?').next())
        .and_then(|last| last.trim_start_matches('p').parse().ok());

    let mut records = Vec::new();
    for cell in document.select(&cell_sel) {
        records.push(RawRecord::new(parse_cell(&cell)?));
    }

    Ok(ResultsPage {
        records,
        total_listings,
        next_page,
    })
}

/// Exhaustion signal for `page`: the total count, unless the "next" link
/// does not move forward.
fn page_signal(parsed: &ResultsPage, page: u32, page_size: u32) -> PageSignal {
    if parsed.next_page.is_some_and(|next| next <= page) {
        return PageSignal::HasNext(false);
    }
    PageSignal::TotalCount {
        total: parsed.total_listings,
        page_size,
    }
}

fn parse_cell(cell: &ElementRef) -> Result<Value> {
    let address_sel = parse_selector("h2.address")?;
    let image_sel = parse_selector("img.card-photo")?;
    let price_sel = parse_selector("span.price")?;
    let type_sel = parse_selector(".property-type")?;
    let feature_sel = parse_selector("ul.features li.feature span.value")?;
    let ld_sel = parse_selector("script[type=\"application/ld+json\"]")?;

    let address = text_of(cell, &address_sel);
    let image_url = cell
        .select(&image_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    // The property type label is nested inside the price element.
    let (price, prop_type) = match cell.select(&price_sel).next() {
        Some(price_el) => {
            let prop_type = text_of(&price_el, &type_sel);
            let full: String = price_el.text().collect();
            let price = if prop_type.is_empty() {
                full
            } else {
                full.replacen(&prop_type, "", 1)
            };
            (price.trim().to_string(), prop_type)
        }
        None => (String::new(), String::new()),
    };

    let features: Vec<String> = cell
        .select(&feature_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect();

    let (description, url) = cell
        .select(&ld_sel)
        .next()
        .map(|script| ld_json_summary(&script.text().collect::<String>()))
        .unwrap_or_default();

    Ok(json!({
        "address": address,
        "imageUrl": image_url,
        "price": price,
        "propType": prop_type,
        "features": features,
        "description": description,
        "url": url,
    }))
}

/// Description and URL from a listing's ld+json block, skipping `RentAction` blocks.
fn ld_json_summary(raw: &str) -> (String, String) {
    let text = raw.replace("//<![CDATA[", "").replace("//]]>", "");
    let json: Value = match serde_json::from_str(text.trim()) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Error parsing listing ld+json: {}", e);
            return Default::default();
        }
    };

    let is_empty = json.as_object().is_none_or(|o| o.is_empty());
    if is_empty || json.get("@type").and_then(Value::as_str) == Some("RentAction") {
        return Default::default();
    }

    let field = |key: &str| {
        json.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    (field("description"), field("url"))
}

fn text_of(el: &ElementRef, selector: &scraper::Selector) -> String {
    el.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
        <div class="listings">
          <h1 class="text-heading"><strong>41</strong> properties for rent</h1>
          <article class="property-cell">
            <h2 class="address">3/10 King St, Newtown NSW 2042</h2>
            <img class="card-photo" src="https://img.rent.com.au/a.jpg">
            <span class="price">$520 per week <span class="property-type">Apartment</span></span>
            <ul class="features">
              <li class="feature"><span class="value">2</span></li>
              <li class="feature"><span class="value">1</span></li>
            </ul>
            <script type="application/ld+json">//<![CDATA[
              {"@type": "Residence", "description": "Bright unit near station", "url": "/property/3-10-king-st-newtown-nsw-2042-p123"}
            //]]></script>
          </article>
          <article class="property-cell">
            <h2 class="address">8 Queen St, Newtown NSW 2042</h2>
            <span class="price">Contact Agent</span>
            <script type="application/ld+json">{"@type": "RentAction", "description": "ignored"}</script>
          </article>
          <ul class="ui-pagination">
            <li class="pge"><a class="-active" href="/properties/newtown-nsw-2042/p1">1</a></li>
            <li class="pge"><a rel="next" href="/properties/newtown-nsw-2042/p2">Next</a></li>
          </ul>
        </div>
    "#;

    fn adapter() -> RentAdapter {
        RentAdapter::new(Client::new(), &SourcesConfig::default())
    }

    #[test]
    fn test_parse_results_page() {
        let page = parse_results_page(RESULTS_HTML).unwrap();
        assert_eq!(page.total_listings, 41);
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.records.len(), 2);

        let first = &page.records[0];
        assert_eq!(first.str_at("price").as_deref(), Some("$520 per week"));
        assert_eq!(first.str_at("propType").as_deref(), Some("Apartment"));
        assert_eq!(first.array_at("features").len(), 2);
        assert_eq!(
            first.str_at("description").as_deref(),
            Some("Bright unit near station")
        );

        let second = &page.records[1];
        assert_eq!(second.str_at("description"), None);
        assert_eq!(second.str_at("url"), None);
        assert_eq!(second.str_at("imageUrl"), None);
    }

    fn results(total_listings: u64, next_page: Option<u32>) -> ResultsPage {
        ResultsPage {
            records: Vec::new(),
            total_listings,
            next_page,
        }
    }

    #[test]
    fn test_next_link_pointing_back_ends_paging() {
        let signal = page_signal(&results(200, Some(1)), 2, 20);
        assert_eq!(signal, PageSignal::HasNext(false));
        assert!(signal.is_exhausted(2));

        assert!(page_signal(&results(200, Some(3)), 3, 20).is_exhausted(3));
    }

    #[test]
    fn test_next_link_forward_uses_total_count() {
        let signal = page_signal(&results(41, Some(2)), 1, 20);
        assert_eq!(
            signal,
            PageSignal::TotalCount {
                total: 41,
                page_size: 20
            }
        );
        assert!(!signal.is_exhausted(2));
        assert!(signal.is_exhausted(3));
    }

    #[test]
    fn test_missing_total_heading_is_exhausted() {
        let page = parse_results_page("<html><body><div class=\"listings\"></div></body></html>")
            .unwrap();
        assert_eq!(page.total_listings, 0);
        assert!(page_signal(&page, 1, 20).is_exhausted(1));
    }

    #[test]
    fn test_search_url_embeds_suburbs() {
        let form = SearchForm::from_pairs([
            ("suburbs", "newtown-nsw-2042"),
            ("rent_high", "600"),
            ("page", "3"),
        ]);
        let url = adapter().search_url(&form, 3).unwrap();
        assert_eq!(
            url,
            "https://www.rent.com.au/properties/newtown-nsw-2042/p3?rent_high=600"
        );
    }

    #[test]
    fn test_missing_suburbs_rejected() {
        let form = SearchForm::from_pairs([("rent_high", "600")]);
        assert!(adapter().validate_form(&form).is_err());
        assert!(adapter().search_url(&form, 1).is_err());
    }

    #[test]
    fn test_normalize_scraped_record() {
        let page = parse_results_page(RESULTS_HTML).unwrap();
        let listing = adapter().normalize(&page.records[0]).unwrap();

        assert_eq!(
            listing.detail_url.as_deref(),
            Some("https://www.rent.com.au/property/3-10-king-st-newtown-nsw-2042-p123")
        );
        assert_eq!(listing.property_type.as_deref(), Some("Apartment"));
        assert_eq!(listing.features, vec!["2", "1", "Type: Apartment"]);
        assert_eq!(listing.headline.as_deref(), Some("Bright unit near station"));
        assert!(listing.description.is_none());
        assert_eq!(listing.images.len(), 1);
    }
}
