//! # journalcache
//!
//! Offline response cache for the journal viewer.
//!
//! ## Architecture
//! - **CacheStorage**: named cache generations, in memory or one file each on disk
//! - **CacheStore**: exact-URL map of stored responses (AHash, RwLock)
//! - **OfflineCache**: install / activate / fetch lifecycle over a `Fetcher`
//!
//! ## Behaviour
//! - Seed URLs are fetched together at install; any failure aborts install
//! - Without a network, `resume` picks up a complete generation left on disk
//! - Activation claims open pages and deletes other generations
//! - Cache hits never touch the network; misses are fetched and not stored

#![warn(missing_docs)]

mod clients;
mod error;
mod fetch;
mod lifecycle;
mod parser;
mod request;
mod stats;
mod store;
mod worker;

pub use clients::{ClientId, ClientRegistry};
pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use lifecycle::WorkerState;
pub use request::{Request, Response};
pub use stats::CacheStats;
pub use store::{CacheStorage, CacheStore};
pub use worker::{CacheConfig, OfflineCache, DEFAULT_CACHE_NAME, DEFAULT_ENTRIES_URL};
