// src/models/mod.rs

//! Domain models for the aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod form;
mod listing;
mod raw;

// Re-export all public types
pub use config::{
    Config, EnrichmentConfig, HttpConfig, PaginationConfig, SourcesConfig, ViewConfig,
};
pub use form::{IMAGES_FIELD, SearchForm};
pub use listing::{
    Address, Agency, CARD_IMAGE_SIZE, CanonicalListing, FULL_IMAGE_SIZE, ImageRef, Inspection,
    Lister, SourceId,
};
pub use raw::{PageSignal, RawPage, RawRecord, is_truthy};
