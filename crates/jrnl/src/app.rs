//! Startup and history traversal, kept apart from stdin/stdout handling

use anyhow::{Context, Result};
use journalcache::{CacheConfig, CacheStorage, Fetcher, OfflineCache, Request};
use journalnav::{Command, Dispatcher, EntryList, MemoryViewPort, Navigator};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What the app starts with
pub struct Session<F> {
    /// Offline cache, when registration succeeded
    pub worker: Option<OfflineCache<F>>,
    /// Entries from the cache or the network; empty when loading failed
    pub entries: EntryList,
}

/// Register the offline cache and load the entry list
///
/// Registration failure is logged and the session continues on the
/// network. Entry loading failure is logged and leaves the list empty.
///
/// # Arguments
/// * `fetcher` - Live network access
/// * `offline` - Storage and generation to register, `None` to skip
/// * `entries_url` - Entries endpoint
/// * `start_url` - URL of the page the cache should control
pub async fn open_session<F: Fetcher + Clone>(
    fetcher: F,
    offline: Option<(CacheStorage, CacheConfig)>,
    entries_url: &str,
    start_url: &str,
) -> Session<F> {
    let worker = match offline {
        Some((storage, config)) => {
            match register_offline_cache(storage, config, fetcher.clone(), start_url).await {
                Ok(worker) => Some(worker),
                Err(e) => {
                    warn!("Offline cache registration failed: {:#}", e);
                    None
                }
            }
        }
        None => None,
    };

    let entries = match load_entries(worker.as_ref(), &fetcher, entries_url).await {
        Ok(entries) => {
            info!("Loaded {} entries", entries.len());
            entries
        }
        Err(e) => {
            error!("Failed to load entries: {:#}", e);
            EntryList::new()
        }
    };

    Session { worker, entries }
}

/// Install and activate; without a network, fall back to the stored generation
pub async fn register_offline_cache<F: Fetcher>(
    storage: CacheStorage,
    config: CacheConfig,
    fetcher: F,
    start_url: &str,
) -> Result<OfflineCache<F>> {
    let worker = OfflineCache::new(config, Arc::new(storage), fetcher);
    worker.clients().register(start_url);

    if let Err(install_err) = worker.on_install().await {
        warn!("Install failed: {}", install_err);
        let stored = worker
            .resume()
            .with_context(|| format!("Install failed ({})", install_err))?;
        info!("Using {} stored responses", stored);
    }

    let claimed = worker.on_activate().context("Activate failed")?;
    info!(
        "Offline cache {} ready, controlling {} page(s)",
        worker.config().cache_name,
        claimed
    );
    Ok(worker)
}

/// Fetch and parse the entry list, through the offline cache when present
pub async fn load_entries<F: Fetcher>(
    worker: Option<&OfflineCache<F>>,
    fetcher: &F,
    url: &str,
) -> Result<EntryList> {
    let request = Request::get(url);
    let response = match worker {
        Some(worker) => worker.on_fetch(&request).await,
        None => fetcher.fetch(&request).await,
    }
    .with_context(|| format!("GET {}", url))?;

    if !response.ok() {
        anyhow::bail!("{} returned status {}", url, response.status());
    }
    EntryList::from_json(response.body()).context("Invalid entry list")
}

/// Step back or forward and show the page the record names
///
/// When the page cannot be shown the history cursor is put back, so the
/// location keeps matching the view. `None` when there is nowhere to go.
pub fn traverse(
    navigator: &mut Navigator<MemoryViewPort, EntryList>,
    dispatcher: &mut Dispatcher,
    back: bool,
) -> Option<journalnav::Result<()>> {
    let history = navigator.view_mut().history_mut();
    let record = if back {
        history.back()
    } else {
        history.forward()
    }?;
    dispatcher.enqueue(Command::PopState(record.page()));

    let result = dispatcher.dispatch_next(navigator)?;
    if result.is_err() {
        let history = navigator.view_mut().history_mut();
        if back {
            history.forward();
        } else {
            history.back();
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use journalcache::{Error, Response, WorkerState};
    use journalnav::{EntryRecord, PageDescriptor, VisualMode};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    const ORIGIN: &str = "http://localhost:8080";
    const ENTRIES: &str = "https://journal.test/entries";
    const STYLE: &str = "https://journal.test/style.css";

    #[derive(Default)]
    struct Network {
        pages: HashMap<String, Response>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl Network {
        fn serve(mut self, url: &str, status: u16, body: &'static str) -> Self {
            self.pages.insert(url.to_string(), Response::new(status, body));
            self
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for Network {
        async fn fetch(&self, request: &Request) -> journalcache::Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::network(request.url(), "network unreachable"));
            }
            self.pages
                .get(request.url())
                .cloned()
                .ok_or_else(|| Error::network(request.url(), "no route"))
        }
    }

    fn journal() -> Arc<Network> {
        Arc::new(Network::default().serve(ENTRIES, 200, r#"[{"title":"Trip","content":"..."}]"#))
    }

    fn config(seeds: &[&str]) -> CacheConfig {
        CacheConfig {
            cache_name: "journal-v1".to_string(),
            seed_urls: seeds.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_session_with_offline_cache() {
        let net = journal();
        let offline = Some((CacheStorage::in_memory(), config(&[ENTRIES])));

        let session = open_session(Arc::clone(&net), offline, ENTRIES, ORIGIN).await;
        let worker = session.worker.unwrap();
        assert_eq!(worker.state(), WorkerState::Running);
        assert_eq!(worker.stats().hits(), 1);
        assert_eq!(session.entries.len(), 1);
        // Seed fetch only; the entry list came from the cache
        assert_eq!(net.calls(), 1);
    }

    #[tokio::test]
    async fn test_registration_failure_falls_back_to_network() {
        let net = Arc::new(
            Network::default()
                .serve(ENTRIES, 200, r#"[{"title":"Trip","content":"..."}]"#)
                .serve(STYLE, 503, "down"),
        );
        let offline = Some((CacheStorage::in_memory(), config(&[ENTRIES, STYLE])));

        let session = open_session(Arc::clone(&net), offline, ENTRIES, ORIGIN).await;
        assert!(session.worker.is_none());
        assert_eq!(session.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_restart_offline_uses_stored_entries() {
        let dir = TempDir::new().unwrap();
        let net = journal();

        let first = open_session(
            Arc::clone(&net),
            Some((CacheStorage::open_dir(dir.path()).unwrap(), config(&[ENTRIES]))),
            ENTRIES,
            ORIGIN,
        )
        .await;
        assert!(first.worker.is_some());
        drop(first);

        net.go_offline();
        let second = open_session(
            Arc::clone(&net),
            Some((CacheStorage::open_dir(dir.path()).unwrap(), config(&[ENTRIES]))),
            ENTRIES,
            ORIGIN,
        )
        .await;
        let worker = second.worker.unwrap();
        assert_eq!(worker.state(), WorkerState::Running);
        assert_eq!(second.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_without_stored_cache_gives_empty_list() {
        let dir = TempDir::new().unwrap();
        let net = journal();
        net.go_offline();

        let offline = Some((CacheStorage::open_dir(dir.path()).unwrap(), config(&[ENTRIES])));
        let session = open_session(Arc::clone(&net), offline, ENTRIES, ORIGIN).await;
        assert!(session.worker.is_none());
        assert!(session.entries.is_empty());
    }

    #[tokio::test]
    async fn test_session_without_offline_cache() {
        let net = journal();
        let session = open_session(Arc::clone(&net), None, ENTRIES, ORIGIN).await;
        assert!(session.worker.is_none());
        assert_eq!(session.entries.len(), 1);
        assert_eq!(net.calls(), 1);
    }

    #[tokio::test]
    async fn test_load_entries_rejects_error_status() {
        let net = Network::default().serve(ENTRIES, 500, "oops");
        let result = load_entries::<Network>(None, &net, ENTRIES).await;
        assert!(result.is_err());
    }

    fn navigator(start_url: &str) -> Navigator<MemoryViewPort, EntryList> {
        let entries: EntryList = (1..=3)
            .map(|i| EntryRecord::new(format!("Day {}", i), "..."))
            .collect();
        Navigator::new(MemoryViewPort::new(start_url), entries, ORIGIN)
    }

    #[test]
    fn test_traverse_back_and_forward() {
        let mut nav = navigator(ORIGIN);
        let mut dispatcher = Dispatcher::new();
        nav.transition(Some(PageDescriptor::Settings), false).unwrap();

        assert!(traverse(&mut nav, &mut dispatcher, true).unwrap().is_ok());
        assert_eq!(nav.view().title(), "Journal Entries");
        assert_eq!(nav.view().history().location(), ORIGIN);

        assert!(traverse(&mut nav, &mut dispatcher, false).unwrap().is_ok());
        assert_eq!(nav.view().mode(), VisualMode::SETTINGS);
        assert!(traverse(&mut nav, &mut dispatcher, false).is_none());
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_traverse_to_missing_entry_keeps_location() {
        let mut nav = navigator("http://localhost:8080#entry9");
        let mut dispatcher = Dispatcher::new();
        nav.transition(Some(PageDescriptor::Settings), false).unwrap();

        let result = traverse(&mut nav, &mut dispatcher, true).unwrap();
        assert!(matches!(result, Err(journalnav::Error::EntryNotFound(_))));
        assert_eq!(nav.view().title(), "Settings");
        assert_eq!(nav.view().history().location(), "http://localhost:8080#settings");
        assert_eq!(nav.view().history().cursor(), 1);
    }
}
