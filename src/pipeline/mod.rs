//! Search pipeline stages.
//!
//! - `paginate`: drive an adapter page by page until exhaustion
//! - `normalize`: project raw records onto canonical listings
//! - `enrich`: fill in descriptions from detail pages
//! - `search`: run the stages for one search and track its lifecycle

pub mod enrich;
pub mod normalize;
pub mod paginate;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use enrich::{EnrichProgress, EnrichmentReport, enrich, is_eligible};
pub use normalize::{NormalizeOutcome, normalize_all};
pub use paginate::{PaginationOutcome, paginate};
pub use search::{
    SearchCoordinator, SearchPhase, SearchSession, SearchStats, SearchTicket, run_search,
};
