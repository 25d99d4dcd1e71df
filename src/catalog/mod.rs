//! Catalog domain: query parameters, the API client, and the pagination
//! state that sits between them and the views.

pub mod client;
pub mod models;
pub mod params;
pub mod reconciler;
pub mod scroll;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{CatalogClient, CatalogError, HttpCatalogClient};
pub use models::{Item, Page, PageMetadata};
pub use params::{
    FileQueryStore, MemoryQueryStore, PageLimit, ParamStore, ParamUpdate, QueryParams,
    QueryStore, SortOrder,
};
pub use reconciler::{FetchOutcome, FetchPlan, Reconciler, ReconcilerStatus};
pub use scroll::{ScrollConfig, ScrollSnapshot, ScrollTrigger};
