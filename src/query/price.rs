// src/query/price.rs

//! Sortable prices from free-form price text.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use super::SortKey;
use crate::models::CanonicalListing;

static WEEK_QUALIFIERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pw|per week|/w|\bweek\b|\bp.w\b").unwrap());

static FROM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bfrom\b").unwrap());

static NON_PRICE_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\$?\s*(?:contact agent|application|no price|call|enquire).*").unwrap()
});

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]").unwrap());

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+\.?\d*|\.\d+)").unwrap());

/// Weekly amount in a price string, or `None` when there is no usable number.
///
/// Ranges collapse to their lower bound: `"$400 - $420 per week"` is 400.
pub fn parse_price(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase();
    let cleaned = WEEK_QUALIFIERS.replace_all(&lowered, "");
    let cleaned = FROM.replace_all(&cleaned, "");
    let cleaned = NON_PRICE_PHRASES.replace_all(&cleaned, "");
    let cleaned = NON_NUMERIC.replace_all(&cleaned, "");

    let first = cleaned.split('-').next().unwrap_or_default();
    leading_number(first)
}

/// Numeric prefix of `text`, ignoring whatever follows it.
fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Order listings by derived price.
///
/// Unparseable prices always come last, in their incoming order.
/// [`SortKey::None`] keeps priced listings in their incoming order.
pub fn sort_by_price(listings: Vec<&CanonicalListing>, key: SortKey) -> Vec<&CanonicalListing> {
    let mut priced = Vec::new();
    let mut unpriced = Vec::new();
    for listing in listings {
        match listing.price.as_deref().and_then(parse_price) {
            Some(price) => priced.push((price, listing)),
            None => unpriced.push(listing),
        }
    }

    match key {
        SortKey::None => {}
        SortKey::PriceAsc => {
            priced.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        }
        SortKey::PriceDesc => {
            priced.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            priced.reverse();
        }
    }

    priced
        .into_iter()
        .map(|(_, listing)| listing)
        .chain(unpriced)
        .collect()
}
