//! Indexed filter engine over the 15-of-25 lottery combination universe,
//! with SQLite-backed favorite filters and suggestion history.
//!
//! # Examples
//!
//! Synchronous usage with [`engine::FilterEngine`]:
//! ```
//! use lotofiltro::{core::store::ComboStore, engine::FilterEngine, filter::FilterSpec, universe};
//!
//! // A small 8-of-10 universe keeps the example cheap; production callers
//! // pass `universe::full_universe()`.
//! let store = ComboStore::new(universe::enumerate(10, 8));
//! let engine = FilterEngine::new(store);
//!
//! let spec = FilterSpec {
//!     sum_min: Some(40),
//!     ..FilterSpec::default()
//! };
//! let page = engine.search(&spec).expect("valid spec");
//! assert!(!page.content.is_empty());
//! assert!(page.content.iter().all(|view| view.sum >= 40));
//! ```
//!
//! Runtime usage with SQLite storage:
//! ```no_run
//! use lotofiltro::{
//!     core::store::ComboStore,
//!     filter::FilterSpec,
//!     persist::sqlite::SqliteStorage,
//!     runtime::handle::{RuntimeConfig, spawn_lotofiltro},
//!     universe,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let storage = SqliteStorage::open("lotofiltro.db").expect("open sqlite");
//! let handle = spawn_lotofiltro(
//!     ComboStore::new(universe::full_universe()),
//!     Some(Box::new(storage)),
//!     RuntimeConfig::default(),
//! )
//! .expect("spawn");
//!
//! let spec = FilterSpec {
//!     even_min: Some(7),
//!     even_max: Some(8),
//!     ..FilterSpec::default()
//! };
//! let id = handle.save_favorite("balanced", spec).await.expect("save");
//! let restored = handle.load_favorite(id).await.expect("load");
//! let page = handle.search(restored).await.expect("search");
//! assert_eq!(page.page, 0);
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Combination records and derived-attribute computation.
pub mod combo;
/// In-memory universe store, indexes, and draw history.
pub mod core;
/// Filter compilation and paginated query execution.
pub mod engine;
/// Named filter persistence store.
pub mod favorites;
/// Filter specification and page types.
pub mod filter;
/// Mutation op model handed to the persistence worker.
pub mod op;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Saved-suggestion history store and CSV export.
pub mod suggestions;
/// Shared primitive types and enums.
pub mod types;
/// Deterministic universe materialization.
pub mod universe;
