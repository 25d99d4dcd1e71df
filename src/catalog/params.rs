//! Query parameters and the string-keyed store they are persisted in.
//!
//! The persisted representation is a flat `key=value` query string, the same
//! shape as a URL query. [`ParamStore`] reads it into a typed [`QueryParams`]
//! (applying defaults) and merges [`ParamUpdate`]s back into it. Changing the
//! category, search text or page size resets pagination to page 1 unless the
//! update sets a page itself.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KEY_PAGE: &str = "page";
pub const KEY_LIMIT: &str = "limit";
pub const KEY_SORT: &str = "sort";
pub const KEY_TYPE: &str = "type";
pub const KEY_SEARCH: &str = "search";

/// Errors from persisting query parameters.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Failed to persist query to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParamError>;

// ── Value types ─────────────────────────────────────────────────────────────

/// Sort order by catalog number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "No. ascending",
            Self::Desc => "No. descending",
        }
    }
}

/// Allowed page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageLimit {
    Five,
    #[default]
    Ten,
    Twenty,
}

impl PageLimit {
    pub const ALL: [PageLimit; 3] = [Self::Five, Self::Ten, Self::Twenty];

    pub fn value(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.value() == value)
    }

    pub fn next(self) -> Self {
        match self {
            Self::Five => Self::Ten,
            Self::Ten => Self::Twenty,
            Self::Twenty => Self::Five,
        }
    }
}

/// Typed view of the persisted query.
///
/// `page` is signed: a hand-edited query may carry `page=-2`, which the
/// reconciler must reject rather than silently repair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pub page: i64,
    pub limit: PageLimit,
    pub sort: SortOrder,
    pub category: Option<String>,
    pub search: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PageLimit::default(),
            sort: SortOrder::default(),
            category: None,
            search: String::new(),
        }
    }
}

/// The part of the params that determines the result set, everything but the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub limit: PageLimit,
    pub sort: SortOrder,
    pub category: Option<String>,
    pub search: String,
}

impl QueryParams {
    /// Copy of these params pointing at another page.
    pub fn with_page(&self, page: i64) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn filter_key(&self) -> FilterKey {
        FilterKey {
            limit: self.limit,
            sort: self.sort,
            category: self.category.clone(),
            search: self.search.clone(),
        }
    }

    /// Canonical form: page 0 reads as page 1 and an empty category as none.
    pub fn normalized(&self) -> Self {
        Self {
            page: if self.page == 0 { 1 } else { self.page },
            limit: self.limit,
            sort: self.sort,
            category: self.category.clone().filter(|c| !c.is_empty()),
            search: self.search.clone(),
        }
    }

    /// Whether any filter control differs from its default.
    pub fn has_active_filters(&self) -> bool {
        self.category.is_some() || !self.search.is_empty() || self.sort != SortOrder::Asc
    }

    /// Build params from key/value pairs, applying defaults.
    pub fn from_pairs<'a>(mut get: impl FnMut(&str) -> Option<&'a str>) -> Self {
        let page = get(KEY_PAGE)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|p| *p != 0)
            .unwrap_or(1);
        let limit = get(KEY_LIMIT)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(PageLimit::from_value)
            .unwrap_or_default();
        let sort = get(KEY_SORT)
            .and_then(SortOrder::parse)
            .unwrap_or_default();
        let category = get(KEY_TYPE)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let search = get(KEY_SEARCH).unwrap_or_default().to_string();

        Self {
            page,
            limit,
            sort,
            category,
            search,
        }
    }
}

/// Encode params as a query string, omitting defaults.
pub fn encode(params: &QueryParams) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    if params.page != 1 {
        serializer.append_pair(KEY_PAGE, &params.page.to_string());
    }
    if params.limit != PageLimit::default() {
        serializer.append_pair(KEY_LIMIT, &params.limit.value().to_string());
    }
    if params.sort != SortOrder::default() {
        serializer.append_pair(KEY_SORT, params.sort.as_str());
    }
    if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
        serializer.append_pair(KEY_TYPE, category);
    }
    if !params.search.is_empty() {
        serializer.append_pair(KEY_SEARCH, &params.search);
    }
    serializer.finish()
}

/// Decode a query string; unknown keys are ignored, the last duplicate wins.
pub fn decode(query: &str) -> QueryParams {
    let pairs = parse_pairs(query);
    QueryParams::from_pairs(|key| pairs.get(key).map(String::as_str))
}

fn parse_pairs(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

// ── Partial updates ─────────────────────────────────────────────────────────

/// A partial change to the query. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamUpdate {
    pub page: Option<i64>,
    pub limit: Option<PageLimit>,
    pub sort: Option<SortOrder>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    /// `Some("")` clears the search text.
    pub search: Option<String>,
}

impl ParamUpdate {
    pub fn page(page: i64) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn limit(limit: PageLimit) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn sort(sort: SortOrder) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    pub fn category(category: Option<String>) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    /// Reset search, category and sort, and go back to page 1. Page size is kept.
    pub fn clear_all() -> Self {
        Self {
            page: Some(1),
            limit: None,
            sort: Some(SortOrder::Asc),
            category: Some(None),
            search: Some(String::new()),
        }
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Whether this update changes a field that invalidates the current pagination.
    fn resets_page(&self) -> bool {
        self.page.is_none()
            && (self.category.is_some() || self.search.is_some() || self.limit.is_some())
    }
}

// ── Stores ──────────────────────────────────────────────────────────────────

/// String-keyed persisted representation of the query.
pub trait QueryStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    /// Current contents as a query string.
    fn query_string(&self) -> String;
    /// Persist pending changes. In-memory stores have nothing to do.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryQueryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryQueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_query(query: &str) -> Self {
        Self {
            entries: parse_pairs(query),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl QueryStore for MemoryQueryStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.entries.iter())
            .finish()
    }
}

/// Store backed by a session file holding the query string, so the last view
/// is restored on the next start.
#[derive(Debug, Clone)]
pub struct FileQueryStore {
    path: PathBuf,
    inner: MemoryQueryStore,
}

impl FileQueryStore {
    /// Open the session file, starting empty if it does not exist or is unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = match std::fs::read_to_string(&path) {
            Ok(contents) => MemoryQueryStore::from_query(contents.trim()),
            Err(e) => {
                log::debug!("No session at {}: {e}", path.display());
                MemoryQueryStore::new()
            }
        };
        Self { path, inner }
    }

    /// Open the session file but replace its contents with `query` (a deep link).
    pub fn open_with_query(path: impl Into<PathBuf>, query: &str) -> Self {
        Self {
            path: path.into(),
            inner: MemoryQueryStore::from_query(query),
        }
    }
}

impl QueryStore for FileQueryStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.inner.set(key, value);
    }

    fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    fn query_string(&self) -> String {
        self.inner.query_string()
    }

    fn commit(&mut self) -> Result<()> {
        let persist = |source| ParamError::Persist {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(persist)?;
        }
        std::fs::write(&self.path, self.inner.query_string()).map_err(persist)
    }
}

impl<S: QueryStore + ?Sized> QueryStore for Box<S> {
    fn get(&self, key: &str) -> Option<&str> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }

    fn query_string(&self) -> String {
        (**self).query_string()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Typed access to a [`QueryStore`].
#[derive(Debug, Clone)]
pub struct ParamStore<S: QueryStore> {
    store: S,
}

impl<S: QueryStore> ParamStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current params with defaults applied.
    pub fn read(&self) -> QueryParams {
        QueryParams::from_pairs(|key| self.store.get(key))
    }

    /// Merge `update` into the store and return the resulting params.
    ///
    /// Empty values remove their key. Touching category, search or limit
    /// without an explicit page forces page 1. Pages below 1 are written as 1.
    pub fn update(&mut self, update: ParamUpdate) -> Result<QueryParams> {
        let resets_page = update.resets_page();

        if let Some(page) = update.page {
            self.store.set(KEY_PAGE, page.max(1).to_string());
        }
        if let Some(limit) = update.limit {
            self.store.set(KEY_LIMIT, limit.value().to_string());
        }
        if let Some(sort) = update.sort {
            self.store.set(KEY_SORT, sort.as_str().to_string());
        }
        if let Some(category) = update.category {
            self.write_text(KEY_TYPE, category.unwrap_or_default());
        }
        if let Some(search) = update.search {
            self.write_text(KEY_SEARCH, search);
        }
        if resets_page {
            self.store.set(KEY_PAGE, "1".to_string());
        }

        self.store.commit()?;
        let params = self.read();
        log::debug!("Query updated: {}", self.store.query_string());
        Ok(params)
    }

    pub fn query_string(&self) -> String {
        self.store.query_string()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn write_text(&mut self, key: &str, value: String) {
        if value.is_empty() {
            self.store.remove(key);
        } else {
            self.store.set(key, value);
        }
    }
}
