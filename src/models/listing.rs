// src/models/listing.rs

//! Canonical listing produced by the normalizer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Image size used for result cards.
pub const CARD_IMAGE_SIZE: &str = "640x480";

/// Image size used for the full-screen viewer.
pub const FULL_IMAGE_SIZE: &str = "1280x960";

/// Upstream site a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Domain,
    Rent,
    RealEstate,
    Flatmates,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Domain,
        SourceId::Rent,
        SourceId::RealEstate,
        SourceId::Flatmates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Domain => "domain",
            SourceId::Rent => "rent",
            SourceId::RealEstate => "realestate",
            SourceId::Flatmates => "flatmates",
        }
    }

    /// Human-readable site name.
    pub fn site_name(&self) -> &'static str {
        match self {
            SourceId::Domain => "domain.com.au",
            SourceId::Rent => "rent.com.au",
            SourceId::RealEstate => "realestate.com.au",
            SourceId::Flatmates => "flatmates.com.au",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "domain" => Ok(SourceId::Domain),
            "rent" | "rentdc" => Ok(SourceId::Rent),
            "realestate" | "realestategraph" | "rea" => Ok(SourceId::RealEstate),
            "flatmates" => Ok(SourceId::Flatmates),
            other => Err(AppError::validation(format!("Unknown source '{other}'"))),
        }
    }
}

/// Postal address, as structured as the source allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full single-line address
    pub full: String,

    /// Abbreviated address (street only), when provided
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Suburb name, when provided separately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
}

impl Address {
    /// Address made of a single flattened line.
    pub fn line(full: impl Into<String>) -> Self {
        Self {
            full: full.into(),
            short: None,
            suburb: None,
        }
    }

    /// Lowercased concatenation of every address part, used by exclusion filters.
    pub fn filter_text(&self) -> String {
        let mut parts = vec![self.full.as_str()];
        parts.extend(self.short.as_deref());
        parts.extend(self.suburb.as_deref());
        parts.join(" ").to_lowercase()
    }

    /// Best single line for display.
    pub fn display(&self) -> &str {
        if !self.full.is_empty() {
            &self.full
        } else {
            self.short.as_deref().unwrap_or_default()
        }
    }
}

/// Image reference: either a ready URL or a template with a `{size}` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageRef {
    Url(String),
    Templated(String),
}

impl ImageRef {
    /// Build a reference, detecting the `{size}` placeholder.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.contains("{size}") {
            ImageRef::Templated(url)
        } else {
            ImageRef::Url(url)
        }
    }

    /// Concrete URL for the requested size.
    pub fn resolve(&self, size: &str) -> String {
        match self {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Templated(template) => template.replace("{size}", size),
        }
    }
}

/// A scheduled open-for-inspection window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,

    /// Ready-made label supplied by the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Inspection {
    /// Format as `Sat, 12 Apr 2025, 10:00 AM - 10:15 AM`.
    ///
    /// The end is shown as a bare time when it falls on the same day.
    pub fn display(&self) -> String {
        if let Some(label) = self.label.as_deref().filter(|l| !l.trim().is_empty()) {
            return label.to_string();
        }

        let Some(start_raw) = self.starts_at.as_deref() else {
            return String::new();
        };
        let Some(start) = parse_timestamp(start_raw) else {
            return start_raw.to_string();
        };

        let mut text = start.format("%a, %-d %b %Y, %-I:%M %p").to_string();
        if let Some(end_raw) = self.ends_at.as_deref() {
            let end = match parse_timestamp(end_raw) {
                Some(end) if end.date() == start.date() => end.format("%-I:%M %p").to_string(),
                Some(end) => end.format("%a, %-d %b %Y, %-I:%M %p").to_string(),
                None => end_raw.to_string(),
            };
            text.push_str(" - ");
            text.push_str(&end);
        }
        text
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::<FixedOffset>::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").ok())
}

/// A person listing the property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lister {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Listing agency details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<ImageRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listers: Vec<Lister>,
}

/// Source-agnostic rental listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    /// Adapter the listing came from; fixed at normalization
    source: SourceId,

    /// Upstream identifier, when the source exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Free-form display price ("$500 pw", "Contact Agent")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,

    /// Free-text room description, used to infer categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<String>,

    #[serde(default)]
    pub images: Vec<ImageRef>,

    /// Short summary from the search response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    /// Full description, inline or filled in by enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Absolute link to the full listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inspection_times: Vec<Inspection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<Agency>,

    #[serde(default)]
    pub bills_included: bool,
}

impl CanonicalListing {
    /// Empty listing tagged with its source.
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            id: None,
            address: None,
            price: None,
            property_type: None,
            rooms: None,
            images: Vec::new(),
            headline: None,
            description: None,
            detail_url: None,
            features: Vec::new(),
            inspection_times: Vec::new(),
            available_date: None,
            bond: None,
            agency: None,
            bills_included: false,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Whether the listing can be shown or linked to at all.
    pub fn has_identity(&self) -> bool {
        let has_address = self
            .address
            .as_ref()
            .is_some_and(|a| !a.display().trim().is_empty());
        let has_link = self
            .detail_url
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        has_address || has_link
    }

    /// Text searched by the description exclusion filter.
    pub fn description_text(&self) -> String {
        self.description
            .as_deref()
            .or(self.headline.as_deref())
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Text searched by the address exclusion filter.
    pub fn address_text(&self) -> String {
        self.address
            .as_ref()
            .map(Address::filter_text)
            .unwrap_or_default()
    }

    /// Price line for display, with the bills note some sources carry.
    pub fn display_price(&self) -> String {
        let mut price = self
            .price
            .clone()
            .unwrap_or_else(|| "Price on application".to_string());
        if self.bills_included {
            price.push_str(" (bills incl.)");
        }
        price
    }

    /// Description for display, falling back to the headline.
    pub fn display_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.headline.as_deref())
            .filter(|d| !d.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_parse_aliases() {
        assert_eq!("rentdc".parse::<SourceId>().unwrap(), SourceId::Rent);
        assert_eq!(
            "RealEstateGraph".parse::<SourceId>().unwrap(),
            SourceId::RealEstate
        );
        assert!("zillow".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_image_templates() {
        let img = ImageRef::from_url("https://i.example.com/{size}/a.jpg");
        assert_eq!(img.resolve(CARD_IMAGE_SIZE), "https://i.example.com/640x480/a.jpg");

        let plain = ImageRef::from_url("https://i.example.com/a.jpg");
        assert_eq!(plain.resolve(FULL_IMAGE_SIZE), "https://i.example.com/a.jpg");
    }

    #[test]
    fn test_address_filter_text_joins_parts() {
        let address = Address {
            full: "1 Main St, Newtown NSW 2042".into(),
            short: Some("1 Main St".into()),
            suburb: Some("Newtown".into()),
        };
        assert_eq!(
            address.filter_text(),
            "1 main st, newtown nsw 2042 1 main st newtown"
        );
    }

    #[test]
    fn test_identity_requires_address_or_link() {
        let mut listing = CanonicalListing::new(SourceId::Domain);
        assert!(!listing.has_identity());

        listing.address = Some(Address::line("   "));
        assert!(!listing.has_identity());

        listing.detail_url = Some("https://www.domain.com.au/1".into());
        assert!(listing.has_identity());
    }

    #[test]
    fn test_inspection_same_day_shows_time_only() {
        let inspection = Inspection {
            starts_at: Some("2025-04-12T10:00:00".into()),
            ends_at: Some("2025-04-12T10:15:00".into()),
            label: None,
        };
        assert_eq!(inspection.display(), "Sat, 12 Apr 2025, 10:00 AM - 10:15 AM");
    }

    #[test]
    fn test_inspection_label_and_unparseable() {
        let labelled = Inspection {
            starts_at: Some("2025-04-12T10:00:00".into()),
            ends_at: None,
            label: Some("Sat 12 Apr, 10:00am".into()),
        };
        assert_eq!(labelled.display(), "Sat 12 Apr, 10:00am");

        let raw = Inspection {
            starts_at: Some("next saturday".into()),
            ends_at: None,
            label: None,
        };
        assert_eq!(raw.display(), "next saturday");
    }

    #[test]
    fn test_display_price_bills_note() {
        let mut listing = CanonicalListing::new(SourceId::Flatmates);
        listing.price = Some("$300 pw".into());
        listing.bills_included = true;
        assert_eq!(listing.display_price(), "$300 pw (bills incl.)");
    }
}
