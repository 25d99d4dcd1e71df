/// Pokedex - terminal catalog browser (TUI Edition)
///
/// Library providing the catalog API client, query-string parameter store,
/// pagination reconciliation and infinite-scroll coordination behind the
/// terminal front end.

pub mod catalog;
pub mod config;
pub mod core;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
