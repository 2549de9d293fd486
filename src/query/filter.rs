// src/query/filter.rs

//! Exclusion filters and listing categories.
//!
//! Every filter here removes what it matches; nothing is an inclusion filter.

use std::collections::BTreeSet;

use super::QuerySpec;
use crate::models::CanonicalListing;

/// Room-type keywords and the category label each implies.
pub const ROOM_TYPES: &[(&str, &str)] = &[
    ("share house", "Share House"),
    ("studio", "Studio"),
    ("whole property", "Whole Property"),
    ("granny flat", "Granny Flat"),
    ("homestay", "Homestay"),
    ("student accommodation", "Student Accommodation"),
];

/// Split comma-separated filter input into lowercase terms.
pub fn parse_terms(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Whether any term occurs in `haystack`, which must already be lowercase.
fn matches_any(haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| haystack.contains(term.as_str()))
}

/// Category labels of a listing: its property type plus any room types
/// named in its room description.
pub fn categories(listing: &CanonicalListing) -> Vec<String> {
    let mut labels = Vec::new();
    let kind = listing
        .property_type
        .as_deref()
        .map(str::trim)
        .filter(|kind| !kind.is_empty());
    labels.extend(kind.map(str::to_string));
    if let Some(rooms) = listing.rooms.as_deref() {
        let rooms = rooms.to_lowercase();
        labels.extend(
            ROOM_TYPES
                .iter()
                .filter(|(keyword, _)| rooms.contains(keyword))
                .map(|(_, label)| label.to_string()),
        );
    }
    labels
}

/// Whether a listing survives every exclusion in `spec`.
pub fn keep(listing: &CanonicalListing, spec: &QuerySpec) -> bool {
    if !spec.address_exclude.is_empty() && matches_any(&listing.address_text(), &spec.address_exclude)
    {
        return false;
    }
    if !spec.description_exclude.is_empty()
        && matches_any(&listing.description_text(), &spec.description_exclude)
    {
        return false;
    }
    if !spec.type_exclude.is_empty()
        && categories(listing)
            .iter()
            .any(|label| spec.type_exclude.contains(label))
    {
        return false;
    }
    true
}

/// Sorted distinct categories across a result set.
///
/// When no listing has a recognisable category but some carry room text,
/// every room-type label is offered.
pub fn available_categories(listings: &[CanonicalListing]) -> Vec<String> {
    let found: BTreeSet<String> = listings.iter().flat_map(categories).collect();
    if found.is_empty() && listings.iter().any(|l| l.rooms.is_some()) {
        let mut labels: Vec<String> = ROOM_TYPES.iter().map(|(_, l)| l.to_string()).collect();
        labels.sort();
        return labels;
    }
    found.into_iter().collect()
}

/// Configured default exclusions that are actually among `available`.
pub fn default_exclusions(available: &[String], configured: &[String]) -> Vec<String> {
    configured
        .iter()
        .filter(|label| available.contains(label))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, SourceId};

    fn listing(address: &str, description: &str) -> CanonicalListing {
        let mut listing = CanonicalListing::new(SourceId::Domain);
        listing.address = Some(Address::line(address));
        listing.description = Some(description.to_string());
        listing
    }

    #[test]
    fn test_parse_terms() {
        assert_eq!(parse_terms(" Redfern, ,WATERLOO ,"), vec!["redfern", "waterloo"]);
        assert!(parse_terms("  ").is_empty());
    }

    #[test]
    fn test_address_terms_exclude() {
        let spec = QuerySpec {
            address_exclude: parse_terms("redfern"),
            ..QuerySpec::default()
        };
        assert!(!keep(&listing("1 George St, Redfern NSW", ""), &spec));
        assert!(keep(&listing("1 King St, Newtown NSW", ""), &spec));
    }

    #[test]
    fn test_description_falls_back_to_headline() {
        let mut summary_only = CanonicalListing::new(SourceId::Rent);
        summary_only.address = Some(Address::line("5 Bay St"));
        summary_only.headline = Some("No pets allowed".into());

        let spec = QuerySpec {
            description_exclude: parse_terms("no pets"),
            ..QuerySpec::default()
        };
        assert!(!keep(&summary_only, &spec));
    }

    #[test]
    fn test_structured_address_parts_are_searched() {
        let mut l = CanonicalListing::new(SourceId::RealEstate);
        l.address = Some(Address {
            full: "4/20 King St".into(),
            short: None,
            suburb: Some("Erskineville".into()),
        });
        let spec = QuerySpec {
            address_exclude: parse_terms("erskineville"),
            ..QuerySpec::default()
        };
        assert!(!keep(&l, &spec));
    }

    #[test]
    fn test_type_exclusion_exact_and_rooms() {
        let mut unit = listing("1 A St", "");
        unit.property_type = Some(" Apartment ".into());
        let mut room = CanonicalListing::new(SourceId::Flatmates);
        room.address = Some(Address::line("Newtown"));
        room.rooms = Some("Room in a Share House".into());

        let spec = QuerySpec {
            type_exclude: ["Apartment".to_string(), "Share House".to_string()].into(),
            ..QuerySpec::default()
        };
        assert!(!keep(&unit, &spec));
        assert!(!keep(&room, &spec));

        let partial = QuerySpec {
            type_exclude: ["Apart".to_string()].into(),
            ..QuerySpec::default()
        };
        assert!(keep(&unit, &partial));
    }

    #[test]
    fn test_available_categories() {
        let mut a = listing("1 A St", "");
        a.property_type = Some("House".into());
        let mut b = listing("2 B St", "");
        b.property_type = Some("Acreage / Semi-Rural".into());
        let c = listing("3 C St", "");

        let available = available_categories(&[a, b, c]);
        assert_eq!(available, vec!["Acreage / Semi-Rural", "House"]);

        let configured = vec![
            "Acreage / Semi-Rural".to_string(),
            "Retirement Living".to_string(),
        ];
        assert_eq!(
            default_exclusions(&available, &configured),
            vec!["Acreage / Semi-Rural"]
        );
    }

    #[test]
    fn test_room_labels_offered_when_nothing_matches() {
        let mut room = CanonicalListing::new(SourceId::Flatmates);
        room.rooms = Some("1 room available".into());
        let available = available_categories(&[room]);
        assert_eq!(available.len(), ROOM_TYPES.len());
        assert_eq!(available[0], "Granny Flat");
    }
}
