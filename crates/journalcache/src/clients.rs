//! Pages the offline cache can control

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Identifier handed out at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

#[derive(Debug)]
struct Client {
    id: ClientId,
    url: String,
    controller: Option<String>,
}

/// Open pages and the cache generation controlling each
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: RwLock<Vec<Client>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page loaded at `url`; it starts uncontrolled
    pub fn register(&self, url: impl Into<String>) -> ClientId {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.clients.write().push(Client {
            id,
            url: url.into(),
            controller: None,
        });
        id
    }

    /// Remove a page
    pub fn unregister(&self, id: ClientId) -> bool {
        let mut clients = self.clients.write();
        let before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != before
    }

    /// Put every page under `generation`
    ///
    /// # Returns
    /// * Number of pages whose controller changed
    pub fn claim(&self, generation: &str) -> usize {
        let mut changed = 0;
        for client in self.clients.write().iter_mut() {
            if client.controller.as_deref() != Some(generation) {
                client.controller = Some(generation.to_string());
                changed += 1;
            }
        }
        changed
    }

    /// Cache generation controlling `id`
    pub fn controller(&self, id: ClientId) -> Option<String> {
        self.clients
            .read()
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.controller.clone())
    }

    /// URL the page was registered with
    pub fn url(&self, id: ClientId) -> Option<String> {
        self.clients
            .read()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.url.clone())
    }

    /// Number of registered pages
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    /// Check if no page is registered
    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
