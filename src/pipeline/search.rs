// src/pipeline/search.rs

//! One search from form submission to a queryable result set.
//!
//! [`SearchCoordinator`] owns the "latest search wins" rule: beginning a
//! search cancels whatever search was running, and results of an abandoned
//! search are never committed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::enrich::{EnrichProgress, EnrichmentReport, enrich, is_eligible};
use super::normalize::{limit_images, normalize_all};
use super::paginate::paginate;
use crate::error::{AppError, Result};
use crate::models::{
    CanonicalListing, Config, IMAGES_FIELD, SearchForm, SourceId, ViewConfig,
};
use crate::query::{self, QuerySpec, ResultPage};
use crate::sources::{DetailFetcher, SourceAdapter};
use crate::utils::log;

/// Where the latest search is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Fetching,
    Enriching,
    Ready,
    Failed(String),
}

/// Handle for one search; stale once a newer search begins.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    id: u64,
    token: CancellationToken,
}

impl SearchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    next_id: u64,
    active: Option<SearchTicket>,
    phase: Option<SearchPhase>,
    current: Option<Arc<SearchSession>>,
}

#[derive(Debug, Default)]
pub struct SearchCoordinator {
    state: Mutex<CoordinatorState>,
}

impl SearchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new search, cancelling the one in flight.
    pub fn begin(&self) -> SearchTicket {
        let mut state = self.state();
        if let Some(previous) = state.active.take() {
            previous.token.cancel();
        }

        state.next_id += 1;
        let ticket = SearchTicket {
            id: state.next_id,
            token: CancellationToken::new(),
        };
        state.active = Some(ticket.clone());
        state.phase = Some(SearchPhase::Fetching);
        state.current = None;
        ticket
    }

    /// Cancel the search in flight, if any, and return to idle.
    pub fn cancel_active(&self) {
        let mut state = self.state();
        if let Some(active) = state.active.take() {
            active.token.cancel();
            state.phase = Some(SearchPhase::Idle);
        }
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.state()
            .active
            .as_ref()
            .is_some_and(|active| active.id == ticket.id)
    }

    pub fn phase(&self) -> SearchPhase {
        self.state().phase.clone().unwrap_or(SearchPhase::Idle)
    }

    /// Record a phase change. Returns false (and changes nothing) for stale tickets.
    pub fn set_phase(&self, ticket: &SearchTicket, phase: SearchPhase) -> bool {
        let mut state = self.state();
        let current = state.active.as_ref().is_some_and(|a| a.id == ticket.id);
        if current {
            state.phase = Some(phase);
        }
        current
    }

    /// Publish a finished session as the current result set.
    pub fn commit(
        &self,
        ticket: &SearchTicket,
        session: SearchSession,
    ) -> Result<Arc<SearchSession>> {
        let mut state = self.state();
        let current = state.active.as_ref().is_some_and(|a| a.id == ticket.id);
        if !current || ticket.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let session = Arc::new(session);
        state.current = Some(Arc::clone(&session));
        state.phase = Some(SearchPhase::Ready);
        Ok(session)
    }

    /// The last committed result set.
    pub fn current(&self) -> Option<Arc<SearchSession>> {
        self.state().current.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub pages_fetched: u32,
    pub hit_safety_bound: bool,
    pub records_fetched: usize,
    pub dropped: usize,
    pub enrichment: EnrichmentReport,
}

/// Normalized, enriched listings of one completed search.
#[derive(Debug, Clone)]
pub struct SearchSession {
    source: SourceId,
    listings: Vec<CanonicalListing>,
    stats: SearchStats,
}

impl SearchSession {
    pub fn new(source: SourceId, listings: Vec<CanonicalListing>, stats: SearchStats) -> Self {
        Self {
            source,
            listings,
            stats,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn listings(&self) -> &[CanonicalListing] {
        &self.listings
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// A successful search that matched nothing.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Filter, sort, and page the result set. Never refetches.
    pub fn view(&self, spec: &QuerySpec) -> ResultPage {
        query::apply(&self.listings, spec)
    }

    pub fn available_categories(&self) -> Vec<String> {
        query::available_categories(&self.listings)
    }

    /// Configured type exclusions that apply to this result set.
    pub fn default_exclusions(&self, view: &ViewConfig) -> Vec<String> {
        query::default_exclusions(&self.available_categories(), &view.default_type_exclusions)
    }
}

/// Run a search end to end and commit it.
///
/// Stops with [`AppError::Cancelled`] as soon as a newer search begins.
/// Other failures move the coordinator to [`SearchPhase::Failed`].
pub async fn run_search(
    coordinator: &SearchCoordinator,
    ticket: &SearchTicket,
    config: &Config,
    adapter: &dyn SourceAdapter,
    fetcher: &dyn DetailFetcher,
    form: &SearchForm,
    progress: impl FnMut(EnrichProgress),
) -> Result<Arc<SearchSession>> {
    match execute(coordinator, ticket, config, adapter, fetcher, form, progress).await {
        Ok(session) => coordinator.commit(ticket, session),
        Err(e) => {
            if !e.is_cancelled() {
                coordinator.set_phase(ticket, SearchPhase::Failed(e.to_string()));
            }
            Err(e)
        }
    }
}

async fn execute(
    coordinator: &SearchCoordinator,
    ticket: &SearchTicket,
    config: &Config,
    adapter: &dyn SourceAdapter,
    fetcher: &dyn DetailFetcher,
    form: &SearchForm,
    progress: impl FnMut(EnrichProgress),
) -> Result<SearchSession> {
    let source = adapter.source();
    adapter.validate_form(form)?;
    let image_limit = form.image_limit();
    let form = &form.without(IMAGES_FIELD);

    log::header(&format!("Searching {}", source.site_name()));
    coordinator.set_phase(ticket, SearchPhase::Fetching);

    log::step(1, 3, "Fetching result pages");
    let pages = paginate(adapter, form, config.pagination.max_pages, ticket.token()).await?;
    log::sub_item(&format!(
        "{} record(s) from {} page(s)",
        pages.records.len(),
        pages.pages_fetched
    ));

    log::step(2, 3, "Normalizing listings");
    let normalized = normalize_all(adapter, &pages.records);
    let mut listings = normalized.listings;
    if let Some(limit) = image_limit {
        limit_images(&mut listings, limit);
    }

    log::step(3, 3, "Enriching descriptions");
    if listings.iter().any(is_eligible) {
        coordinator.set_phase(ticket, SearchPhase::Enriching);
    }
    let report = enrich(
        &mut listings,
        fetcher,
        &config.enrichment,
        ticket.token(),
        progress,
    )
    .await?;

    let stats = SearchStats {
        pages_fetched: pages.pages_fetched,
        hit_safety_bound: pages.hit_safety_bound,
        records_fetched: pages.records.len(),
        dropped: normalized.dropped,
        enrichment: report,
    };

    log::summary(
        &format!("{} search", source.site_name()),
        &[
            ("Pages", stats.pages_fetched.to_string()),
            ("Records", stats.records_fetched.to_string()),
            ("Listings", listings.len().to_string()),
            ("Dropped", stats.dropped.to_string()),
            (
                "Descriptions",
                format!("{} fetched, {} failed", report.enriched, report.failed),
            ),
        ],
    );
    if stats.hit_safety_bound {
        log::warn("Search stopped at the page limit; more results may exist");
    }

    Ok(SearchSession::new(source, listings, stats))
}
