//! In-memory catalog used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::client::{CatalogClient, CatalogError, Result};
use super::models::{fixtures, CaptureResponse, FilterMetadata, Page, PageMetadata};
use super::params::QueryParams;

/// Failure to return for a page.
#[derive(Debug, Clone)]
pub enum MockFailure {
    Upstream {
        message: String,
        max_page: Option<u32>,
    },
    Http(u16),
}

impl MockFailure {
    pub fn upstream(message: &str, max_page: Option<u32>) -> Self {
        Self::Upstream {
            message: message.to_string(),
            max_page,
        }
    }

    fn to_error(&self) -> CatalogError {
        match self {
            Self::Upstream { message, max_page } => {
                CatalogError::upstream(400, message.clone(), *max_page)
            }
            Self::Http(status) => CatalogError::Http { status: *status },
        }
    }
}

/// A mock catalog of `total_pages` pages of fixture items.
///
/// Items are typed after the requested category (or "Grass"), so results for
/// different filters can be told apart.
pub struct MockCatalog {
    total_pages: u32,
    /// Failures by page number
    failures: RwLock<HashMap<u32, MockFailure>>,
    renamed: RwLock<HashMap<u64, String>>,
    captured: RwLock<HashSet<u64>>,
    /// Repeat the last item of the previous page at the start of each page
    overlap: AtomicBool,
    fail_captures: AtomicBool,
    fail_categories: AtomicBool,
    /// Delay before responding (ms)
    response_delay_ms: AtomicU32,
    /// Every page requested, in call order
    requested: Mutex<Vec<u32>>,
    in_flight: AtomicU32,
    peak_in_flight: AtomicU32,
    capture_call_count: AtomicU32,
}

impl MockCatalog {
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            failures: RwLock::new(HashMap::new()),
            renamed: RwLock::new(HashMap::new()),
            captured: RwLock::new(HashSet::new()),
            overlap: AtomicBool::new(false),
            fail_captures: AtomicBool::new(false),
            fail_categories: AtomicBool::new(false),
            response_delay_ms: AtomicU32::new(0),
            requested: Mutex::new(Vec::new()),
            in_flight: AtomicU32::new(0),
            peak_in_flight: AtomicU32::new(0),
            capture_call_count: AtomicU32::new(0),
        }
    }

    pub async fn fail_page(&self, page: u32, failure: MockFailure) {
        self.failures.write().await.insert(page, failure);
    }

    pub async fn rename(&self, id: u64, name: &str) {
        self.renamed.write().await.insert(id, name.to_string());
    }

    pub async fn mark_captured(&self, id: u64) {
        self.captured.write().await.insert(id);
    }

    pub async fn overlap_pages(&self) {
        self.overlap.store(true, Ordering::SeqCst);
    }

    pub async fn fail_captures(&self, fail: bool) {
        self.fail_captures.store(fail, Ordering::SeqCst);
    }

    pub fn fail_categories(&self, fail: bool) {
        self.fail_categories.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay_ms: u32) {
        self.response_delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.requested.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Highest number of page requests that were pending at the same time.
    pub fn peak_in_flight(&self) -> u32 {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn capture_count(&self) -> u32 {
        self.capture_call_count.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let delay = self.response_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(u64::from(delay))).await;
        }
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn fetch_page(&self, params: &QueryParams) -> Result<Page> {
        let page = u32::try_from(params.page.max(1)).unwrap_or(u32::MAX);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(page);
        }
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(pending, Ordering::SeqCst);

        self.delay().await;
        let result = self.respond(page, params).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn fetch_categories(&self) -> Result<Vec<String>> {
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(CatalogError::Http { status: 503 });
        }
        Ok(vec![
            "Fire".to_string(),
            "Grass".to_string(),
            "Water".to_string(),
        ])
    }

    async fn set_captured(&self, id: u64, captured: bool) -> Result<CaptureResponse> {
        self.capture_call_count.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.fail_captures.load(Ordering::SeqCst) {
            return Err(CatalogError::upstream(500, "Failed to capture", None));
        }

        let mut set = self.captured.write().await;
        if captured {
            set.insert(id);
        } else {
            set.remove(&id);
        }
        Ok(CaptureResponse {
            success: true,
            message: Some(if captured { "captured" } else { "released" }.to_string()),
            captured,
            error: None,
        })
    }
}

impl MockCatalog {
    async fn respond(&self, page: u32, params: &QueryParams) -> Result<Page> {
        if let Some(failure) = self.failures.read().await.get(&page) {
            return Err(failure.to_error());
        }

        let limit = params.limit.value();
        let captured = self.captured.read().await;

        if self.total_pages == 0 {
            return Ok(Page {
                items: Vec::new(),
                metadata: PageMetadata {
                    page: 1,
                    limit,
                    ..PageMetadata::default()
                },
                filters: FilterMetadata::default(),
            });
        }
        if page > self.total_pages {
            return Err(CatalogError::upstream(
                400,
                format!(
                    "Invalid page. Max page allowed is {} for limit {}.",
                    self.total_pages, limit
                ),
                Some(self.total_pages),
            ));
        }

        let mut result = fixtures::page(page, self.total_pages, limit);
        if page > 1 && self.overlap.load(Ordering::SeqCst) {
            let previous = u64::from((page - 1) * limit);
            result.items.insert(0, fixtures::item(previous));
        }

        let renamed = self.renamed.read().await;
        let category = params.category.clone().unwrap_or_else(|| "Grass".to_string());
        for item in &mut result.items {
            item.type_one = category.clone();
            item.captured = captured.contains(&item.id);
            if let Some(name) = renamed.get(&item.id) {
                item.name = name.clone();
            }
        }
        result.metadata.captured_count = captured.len() as u32;
        Ok(result)
    }
}
