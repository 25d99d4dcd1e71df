//! Pagination reconciler.
//!
//! Owns the accumulated item list for the active query and decides, for every
//! new [`QueryParams`], how to bring it up to date:
//!
//! - page 1: one fetch whose results replace the list
//! - page N with a non-empty list: one fetch whose results are merged in
//! - page N with an empty list (deep link, restored session): pages `1..=N`
//!   fetched with bounded concurrency, in page order, and accepted only if
//!   all succeed. The first failure stops the batch.
//!
//! Work is split into [`Reconciler::begin`] (synchronous, decides the plan),
//! [`execute`] (async, talks to the client) and [`Reconciler::apply`]
//! (synchronous, merges). Every plan carries a [`FetchToken`]; only the
//! outcome of the most recently issued plan is applied, so a slow response
//! for an old query can never overwrite a newer one.

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};

use super::client::{CatalogClient, CatalogError};
use super::models::{CaptureResponse, Item, Page, PageMetadata};
use super::params::{FilterKey, QueryParams};

pub const PAGE_TOO_LOW: &str = "Page number must be at least 1.";
pub const PAGE_OUT_OF_RANGE: &str = "Page number exceeds available data.";

/// Maximum number of catch-up page requests in flight at once.
pub const CATCH_UP_CONCURRENCY: usize = 4;

/// Identifies one issued fetch. Newer tokens compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerStatus {
    Idle,
    Fetching,
    Error {
        message: String,
        /// Highest valid page known when the error was recorded.
        max_page: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// Fetch one page. Page 1 replaces the list, later pages extend it.
    Single { page: u32 },
    /// Fetch pages `1..=through` and accept them together.
    CatchUp { through: u32 },
}

/// A fetch decided by [`Reconciler::begin`], to be run by [`execute`].
#[derive(Debug, Clone)]
pub struct FetchPlan {
    token: FetchToken,
    params: QueryParams,
    kind: PlanKind,
}

impl FetchPlan {
    pub fn token(&self) -> FetchToken {
        self.token
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }
}

#[derive(Debug)]
enum OutcomeKind {
    Single {
        page: u32,
        result: Result<Page, CatalogError>,
    },
    CatchUp {
        /// One entry per page, in page order.
        results: Vec<(u32, Result<Page, CatalogError>)>,
    },
}

/// Result of running a [`FetchPlan`].
#[derive(Debug)]
pub struct FetchOutcome {
    token: FetchToken,
    kind: OutcomeKind,
}

impl FetchOutcome {
    pub fn token(&self) -> FetchToken {
        self.token
    }
}

/// A capture or release waiting to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub id: u64,
    pub captured: bool,
}

#[derive(Debug)]
pub struct CaptureOutcome {
    pub request: CaptureRequest,
    pub result: Result<CaptureResponse, CatalogError>,
}

/// Run a plan against the client. Catch-up pages are requested at most
/// [`CATCH_UP_CONCURRENCY`] at a time and collected in page order; no further
/// pages are requested once one fails.
pub async fn execute<C>(client: &C, plan: FetchPlan) -> FetchOutcome
where
    C: CatalogClient + ?Sized,
{
    let FetchPlan {
        token,
        params,
        kind,
    } = plan;

    let kind = match kind {
        PlanKind::Single { page } => {
            let result = client.fetch_page(&params.with_page(i64::from(page))).await;
            OutcomeKind::Single { page, result }
        }
        PlanKind::CatchUp { through } => {
            let params = &params;
            let mut requests = stream::iter(1..=through)
                .map(|page| {
                    let params = params.with_page(i64::from(page));
                    async move { (page, client.fetch_page(&params).await) }
                })
                .buffered(CATCH_UP_CONCURRENCY);

            let mut results = Vec::new();
            while let Some((page, result)) = requests.next().await {
                let failed = result.is_err();
                results.push((page, result));
                if failed {
                    break;
                }
            }
            OutcomeKind::CatchUp { results }
        }
    };

    FetchOutcome { token, kind }
}

/// Send a capture or release request.
pub async fn execute_capture<C>(client: &C, request: CaptureRequest) -> CaptureOutcome
where
    C: CatalogClient + ?Sized,
{
    let result = client.set_captured(request.id, request.captured).await;
    CaptureOutcome { request, result }
}

/// Accumulated pagination state for one view.
#[derive(Debug)]
pub struct Reconciler {
    items: Vec<Item>,
    metadata: Option<PageMetadata>,
    status: ReconcilerStatus,
    /// Highest valid page for the active filter, once learned.
    upper_bound: Option<u32>,
    /// Filter the upper bound was learned under.
    filter_key: Option<FilterKey>,
    /// Token of the plan whose outcome will be accepted.
    current: Option<FetchToken>,
    next_token: u64,
    /// Items with a capture/release in flight.
    updating: HashSet<u64>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            metadata: None,
            status: ReconcilerStatus::Idle,
            upper_bound: None,
            filter_key: None,
            current: None,
            next_token: 0,
            updating: HashSet::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: u64) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn metadata(&self) -> Option<&PageMetadata> {
        self.metadata.as_ref()
    }

    pub fn status(&self) -> &ReconcilerStatus {
        &self.status
    }

    pub fn is_fetching(&self) -> bool {
        self.status == ReconcilerStatus::Fetching
    }

    pub fn upper_bound(&self) -> Option<u32> {
        self.upper_bound
    }

    pub fn captured_count(&self) -> u32 {
        self.metadata.map(|m| m.captured_count).unwrap_or(0)
    }

    pub fn is_updating(&self, id: u64) -> bool {
        self.updating.contains(&id)
    }

    pub fn has_captures_in_flight(&self) -> bool {
        !self.updating.is_empty()
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ReconcilerStatus::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Error text with a hint pointing back into the valid range, if known.
    pub fn display_error(&self) -> Option<String> {
        match &self.status {
            ReconcilerStatus::Error {
                message,
                max_page: Some(max),
            } => Some(format!("{message} (Try a page between 1 and {max})")),
            ReconcilerStatus::Error { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    // ── Fetching ────────────────────────────────────────────────────────

    /// Decide how to satisfy `params`.
    ///
    /// Returns `None` when the request is rejected locally (page below 1 or
    /// past the known upper bound); the status is then already `Error`.
    /// Any previously issued plan is superseded either way.
    pub fn begin(&mut self, params: &QueryParams) -> Option<FetchPlan> {
        let key = params.filter_key();
        if self.filter_key.as_ref() != Some(&key) {
            if self.upper_bound.take().is_some() {
                log::debug!("Filter changed, clearing page bound");
            }
            self.filter_key = Some(key);
        }

        self.current = None;

        if params.page < 1 {
            self.reject(PAGE_TOO_LOW);
            return None;
        }

        let Ok(page) = u32::try_from(params.page) else {
            self.reject(PAGE_OUT_OF_RANGE);
            return None;
        };
        if self.upper_bound.is_some_and(|bound| page > bound) {
            self.reject(PAGE_OUT_OF_RANGE);
            return None;
        }

        let kind = if self.items.is_empty() && page > 1 {
            PlanKind::CatchUp { through: page }
        } else {
            PlanKind::Single { page }
        };

        self.next_token += 1;
        let token = FetchToken(self.next_token);
        self.current = Some(token);
        self.status = ReconcilerStatus::Fetching;

        log::debug!("Fetch {:?} issued: {:?}", token, kind);

        Some(FetchPlan {
            token,
            params: params.clone(),
            kind,
        })
    }

    /// Apply a finished fetch. Returns `false` if it was superseded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if self.current != Some(outcome.token) {
            log::debug!("Discarding stale fetch {:?}", outcome.token);
            return false;
        }
        self.current = None;

        match outcome.kind {
            OutcomeKind::Single { page, result } => match result {
                Ok(fetched) => {
                    if page == 1 {
                        self.items = dedupe_by_id(fetched.items);
                    } else {
                        merge_page(&mut self.items, fetched.items);
                    }
                    self.accept_metadata(fetched.metadata);
                }
                Err(e) => {
                    self.fail(&e);
                    if page == 1 {
                        self.items.clear();
                    }
                }
            },
            OutcomeKind::CatchUp { results } => {
                let mut pages = Vec::with_capacity(results.len());
                for (page, result) in results {
                    match result {
                        Ok(fetched) => pages.push(fetched),
                        Err(e) => {
                            log::warn!("Catch-up failed at page {page}: {e}");
                            self.fail(&e);
                            self.items.clear();
                            return true;
                        }
                    }
                }

                let last_metadata = pages.last().map(|p| p.metadata);
                self.items = dedupe_by_id(pages.into_iter().flat_map(|p| p.items).collect());
                match last_metadata {
                    Some(metadata) => self.accept_metadata(metadata),
                    None => self.status = ReconcilerStatus::Idle,
                }
            }
        }

        true
    }

    /// `begin` + `execute` + `apply` for callers that can await in place.
    pub async fn reconcile<C>(&mut self, client: &C, params: &QueryParams) -> bool
    where
        C: CatalogClient + ?Sized,
    {
        match self.begin(params) {
            Some(plan) => {
                let outcome = execute(client, plan).await;
                self.apply(outcome)
            }
            None => false,
        }
    }

    fn accept_metadata(&mut self, metadata: PageMetadata) {
        self.set_upper_bound(metadata.total_pages);
        self.metadata = Some(metadata);
        self.status = ReconcilerStatus::Idle;
    }

    /// An empty result set reports zero pages; that is not a usable bound.
    fn set_upper_bound(&mut self, bound: u32) {
        if bound > 0 {
            self.upper_bound = Some(bound);
        }
    }

    fn reject(&mut self, message: &str) {
        log::info!("Rejected page request: {message}");
        self.items.clear();
        self.status = ReconcilerStatus::Error {
            message: message.to_string(),
            max_page: self.upper_bound,
        };
    }

    fn fail(&mut self, error: &CatalogError) {
        log::warn!("Catalog fetch failed: {error}");
        if let Some(max) = error.max_page() {
            self.set_upper_bound(max);
        }
        self.status = ReconcilerStatus::Error {
            message: error.display_message(),
            max_page: self.upper_bound,
        };
    }

    // ── Capture / release ───────────────────────────────────────────────

    /// Mark `id` as updating. Returns `None` if a request for it is already in flight.
    pub fn begin_capture(&mut self, id: u64, captured: bool) -> Option<CaptureRequest> {
        if !self.updating.insert(id) {
            log::debug!("Capture for {id} already in flight");
            return None;
        }
        Some(CaptureRequest { id, captured })
    }

    /// Apply a finished capture/release. Failures are logged and leave the
    /// list untouched. Returns whether the state changed.
    pub fn apply_capture(&mut self, outcome: CaptureOutcome) -> bool {
        let CaptureRequest { id, captured } = outcome.request;
        self.updating.remove(&id);

        if let Err(e) = outcome.result {
            let action = if captured { "Capture" } else { "Release" };
            log::warn!("{action} failed for item {id}: {e}");
            return false;
        }

        // An item outside the loaded list still changed on the server.
        let changed = match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) if item.captured != captured => {
                item.captured = captured;
                true
            }
            Some(_) => false,
            None => true,
        };

        if changed {
            if let Some(metadata) = self.metadata.as_mut() {
                metadata.captured_count = if captured {
                    metadata.captured_count + 1
                } else {
                    metadata.captured_count.saturating_sub(1)
                };
            }
        }

        changed
    }

    /// `begin_capture` + `execute_capture` + `apply_capture`.
    pub async fn set_captured<C>(&mut self, client: &C, id: u64, captured: bool) -> bool
    where
        C: CatalogClient + ?Sized,
    {
        match self.begin_capture(id, captured) {
            Some(request) => {
                let outcome = execute_capture(client, request).await;
                self.apply_capture(outcome)
            }
            None => false,
        }
    }
}

/// Remove duplicate ids, keeping the first position and the last attributes.
fn dedupe_by_id(items: Vec<Item>) -> Vec<Item> {
    let mut positions: HashMap<u64, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(&item.id) {
            Some(&pos) => unique[pos] = item,
            None => {
                positions.insert(item.id, unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

/// Append `page` to `items`, first dropping existing entries the page also contains.
fn merge_page(items: &mut Vec<Item>, page: Vec<Item>) {
    let page = dedupe_by_id(page);
    let incoming: HashSet<u64> = page.iter().map(|i| i.id).collect();
    items.retain(|i| !incoming.contains(&i.id));
    items.extend(page);
}
