//! OfflineCache: install, activate and fetch interception

use std::sync::Arc;

use futures::future::try_join_all;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::clients::ClientRegistry;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::lifecycle::WorkerState;
use crate::request::{Request, Response};
use crate::stats::CacheStats;
use crate::store::{CacheStorage, CacheStore};

/// Default cache generation name; bump it to invalidate old caches on deploy
pub const DEFAULT_CACHE_NAME: &str = "journal-cache-v1";

/// Default entries endpoint, also the default seed URL
pub const DEFAULT_ENTRIES_URL: &str = "https://cse110lab6.herokuapp.com/entries";

/// What to cache and under which generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache generation name
    pub cache_name: String,
    /// URLs fetched and stored at install
    pub seed_urls: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            seed_urls: vec![DEFAULT_ENTRIES_URL.to_string()],
        }
    }
}

/// Fetch interceptor that answers seed URLs from a persistent cache
pub struct OfflineCache<F> {
    /// Generation name and seed list
    config: CacheConfig,

    /// Every cache generation of the application
    storage: Arc<CacheStorage>,

    /// Live network access
    fetcher: F,

    /// Lifecycle position
    state: RwLock<WorkerState>,

    /// Store of the current generation, set by install
    store: RwLock<Option<Arc<CacheStore>>>,

    /// Pages this worker may control
    clients: Arc<ClientRegistry>,

    /// Interception counters
    stats: Arc<CacheStats>,
}

impl<F: Fetcher> OfflineCache<F> {
    /// Create an uninstalled worker
    ///
    /// # Arguments
    /// * `config` - Cache generation name and seed URLs
    /// * `storage` - Where cache generations live
    /// * `fetcher` - Live network access
    pub fn new(config: CacheConfig, storage: Arc<CacheStorage>, fetcher: F) -> Self {
        Self {
            config,
            storage,
            fetcher,
            state: RwLock::new(WorkerState::Uninstalled),
            store: RwLock::new(None),
            clients: Arc::new(ClientRegistry::new()),
            stats: Arc::new(CacheStats::new()),
        }
    }

    fn expect_state(&self, expected: WorkerState) -> Result<()> {
        let actual = *self.state.read();
        if actual != expected {
            return Err(Error::InvalidState { expected, actual });
        }
        Ok(())
    }

    async fn fetch_seed(&self, request: &Request) -> Result<Response> {
        self.stats.record_network_fetch();
        let response = self.fetcher.fetch(request).await?;
        if !response.ok() {
            return Err(Error::Status {
                url: request.url().to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    /// Open the cache generation and store every seed URL
    ///
    /// All seed fetches run concurrently and must all succeed with a 2xx
    /// status; otherwise nothing is stored and the worker stays uninstalled.
    ///
    /// # Errors
    /// * `Error::InvalidState` - Not uninstalled
    /// * `Error::Network` / `Error::Status` - A seed fetch failed
    pub async fn on_install(&self) -> Result<()> {
        self.expect_state(WorkerState::Uninstalled)?;

        let store = self.storage.open(&self.config.cache_name)?;
        info!("Opened cache {}", store.name());

        let requests: Vec<Request> = self.config.seed_urls.iter().map(Request::get).collect();
        let responses = try_join_all(requests.iter().map(|req| self.fetch_seed(req))).await?;

        let seeded = requests.len() as u64;
        store.put_all(requests.into_iter().zip(responses).collect())?;
        self.stats.record_seeded(seeded);

        *self.store.write() = Some(store);
        *self.state.write() = WorkerState::Installed;
        info!("Installed {} seed responses", seeded);
        Ok(())
    }

    /// Pick up the generation a previous run installed, without the network
    ///
    /// The stored generation must hold a response for every seed URL. On
    /// success the worker is Installed and can be activated as usual.
    ///
    /// # Returns
    /// * `Result<usize>` - Number of stored responses
    ///
    /// # Errors
    /// * `Error::InvalidState` - Not uninstalled
    /// * `Error::CacheNotFound` - No stored generation of this name
    /// * `Error::MissingSeed` - The stored generation is incomplete
    pub fn resume(&self) -> Result<usize> {
        self.expect_state(WorkerState::Uninstalled)?;

        let name = &self.config.cache_name;
        if !self.storage.has(name) {
            return Err(Error::CacheNotFound(name.clone()));
        }

        let store = self.storage.open(name)?;
        let unseeded = self
            .config
            .seed_urls
            .iter()
            .find(|url| store.match_request(&Request::get(url.as_str())).is_none());
        if let Some(url) = unseeded {
            return Err(Error::MissingSeed {
                cache: name.clone(),
                url: url.clone(),
            });
        }

        let stored = store.len();
        *self.store.write() = Some(store);
        *self.state.write() = WorkerState::Installed;
        info!("Resumed cache {} with {} stored responses", name, stored);
        Ok(stored)
    }

    /// Take control of every registered page and drop stale generations
    ///
    /// # Returns
    /// * `Result<usize>` - Number of pages claimed
    pub fn on_activate(&self) -> Result<usize> {
        self.expect_state(WorkerState::Installed)?;

        for name in self.storage.keys() {
            if name != self.config.cache_name && self.storage.delete(&name)? {
                info!("Deleted stale cache {}", name);
            }
        }

        let claimed = self.clients.claim(&self.config.cache_name);
        *self.state.write() = WorkerState::Activated;
        info!("Activated; claimed {} clients", claimed);
        Ok(claimed)
    }

    /// Answer `request` from the cache, or from the network on a miss
    ///
    /// Network responses are returned as received and never stored. Before
    /// activation every request goes straight to the network.
    pub async fn on_fetch(&self, request: &Request) -> Result<Response> {
        let store = {
            let mut state = self.state.write();
            if state.intercepts_fetch() {
                *state = WorkerState::Running;
                self.store.read().clone()
            } else {
                None
            }
        };

        if let Some(store) = store {
            if let Some(response) = store.match_request(request) {
                self.stats.record_hit();
                debug!("Cache hit: {}", request.url());
                return Ok(response);
            }
            self.stats.record_miss();
            debug!("Cache miss: {}", request.url());
        }

        self.stats.record_network_fetch();
        self.fetcher.fetch(request).await
    }

    /// Lifecycle position
    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    /// Store of the current generation, once installed
    pub fn store(&self) -> Option<Arc<CacheStore>> {
        self.store.read().clone()
    }

    /// Pages this worker may control
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Interception counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Generation name and seed list
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
