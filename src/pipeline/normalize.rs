// src/pipeline/normalize.rs

//! Normalizer stage: raw records to canonical listings.

use crate::models::{CanonicalListing, RawRecord};
use crate::sources::SourceAdapter;

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub listings: Vec<CanonicalListing>,
    /// Records that were malformed or had neither address nor link
    pub dropped: usize,
}

/// Project every record through the adapter, preserving order.
pub fn normalize_all(adapter: &dyn SourceAdapter, records: &[RawRecord]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for record in records {
        match adapter.normalize(record) {
            Some(listing) if listing.has_identity() => outcome.listings.push(listing),
            _ => outcome.dropped += 1,
        }
    }

    if outcome.dropped > 0 {
        log::info!(
            "Dropped {} malformed {} record(s) during normalization",
            outcome.dropped,
            adapter.source()
        );
    }
    outcome
}

/// Keep at most `limit` images per listing; zero clears them.
pub fn limit_images(listings: &mut [CanonicalListing], limit: usize) {
    for listing in listings {
        listing.images.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{FakeAdapter, record};
    use crate::models::{ImageRef, SourceId};
    use serde_json::json;

    #[test]
    fn test_preserves_order_and_drops_unidentified() {
        let adapter = FakeAdapter::new(Vec::new());
        let records = vec![
            record("1 First St"),
            RawRecord::new(json!({ "price": "$400 pw" })),
            RawRecord::new(json!(["not", "an", "object"])),
            record("3 Third St"),
            RawRecord::new(json!({ "url": "https://www.domain.com.au/4" })),
        ];

        let outcome = normalize_all(&adapter, &records);

        assert_eq!(outcome.dropped, 2);
        let addresses: Vec<_> = outcome
            .listings
            .iter()
            .map(|l| l.address.as_ref().map(|a| a.full.as_str()))
            .collect();
        assert_eq!(addresses, vec![Some("1 First St"), Some("3 Third St"), None]);
        assert!(outcome.listings.iter().all(|l| l.source() == adapter.source()));
    }

    fn with_images(count: usize) -> CanonicalListing {
        let mut listing = CanonicalListing::new(SourceId::Domain);
        listing.images = (0..count)
            .map(|i| ImageRef::from_url(format!("https://i.example.com/{i}.jpg")))
            .collect();
        listing
    }

    #[test]
    fn test_limit_images() {
        let mut listings = vec![with_images(5), with_images(1), with_images(0)];
        limit_images(&mut listings, 2);
        let counts: Vec<usize> = listings.iter().map(|l| l.images.len()).collect();
        assert_eq!(counts, vec![2, 1, 0]);

        limit_images(&mut listings, 0);
        assert!(listings.iter().all(|l| l.images.is_empty()));
    }
}
