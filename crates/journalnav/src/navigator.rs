//! Navigator: applies page transitions to a viewport

use tracing::debug;

use crate::entry::EntrySource;
use crate::error::{Error, Result};
use crate::history::HistoryRecord;
use crate::page::PageDescriptor;
use crate::viewport::{ViewPort, VisualMode};

/// Keeps a viewport and its session history in step with one page
pub struct Navigator<V, E> {
    /// Surface being driven
    view: V,

    /// Entry data for single-entry pages
    entries: E,

    /// Application root URL; history URLs hang off it
    origin: String,

    /// Page most recently applied
    current: PageDescriptor,

    /// Number of successful transitions
    transitions: u64,
}

impl<V: ViewPort, E: EntrySource> Navigator<V, E> {
    /// Create a navigator showing the home page
    ///
    /// # Arguments
    /// * `view` - Viewport to drive
    /// * `entries` - Entry lookup
    /// * `origin` - Application root URL, e.g. `http://localhost:8080`
    pub fn new(view: V, entries: E, origin: impl Into<String>) -> Self {
        Self {
            view,
            entries,
            origin: origin.into(),
            current: PageDescriptor::Home,
            transitions: 0,
        }
    }

    /// Switch to `descriptor`
    ///
    /// `None` is the home page. When `from_history` is set the transition
    /// mirrors a back/forward step and no history record is pushed.
    ///
    /// # Errors
    /// * `Error::EntryNotFound` - Entry page for an unknown identifier; the
    ///   viewport and history are left untouched
    pub fn transition(
        &mut self,
        descriptor: Option<PageDescriptor>,
        from_history: bool,
    ) -> Result<()> {
        let page = descriptor.unwrap_or_default();

        match page {
            PageDescriptor::Home => {
                self.view.set_visual_mode(VisualMode::empty());
                self.view.set_title(&page.title());
            }
            PageDescriptor::Entry { num } => {
                let entry = self.entries.entry(num).ok_or(Error::EntryNotFound(num))?;
                self.view.set_visual_mode(VisualMode::SINGLE_ENTRY);
                self.view.set_title(&page.title());
                self.view.replace_entry_view(num, entry);
            }
            PageDescriptor::Settings => {
                self.view.set_visual_mode(VisualMode::SETTINGS);
                self.view.set_title(&page.title());
            }
        }

        if !from_history {
            self.view.push_history(HistoryRecord::new(page, &self.origin));
        }

        debug!(?page, from_history, "transition applied");
        self.current = page;
        self.transitions += 1;
        Ok(())
    }

    /// Page most recently applied
    pub fn current(&self) -> PageDescriptor {
        self.current
    }

    /// Number of successful transitions
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Application root URL
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Viewport being driven
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Viewport being driven, mutably (back/forward live here)
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Entry lookup
    pub fn entries(&self) -> &E {
        &self.entries
    }

    /// Replace the entry lookup, e.g. once the entry list has loaded
    pub fn set_entries(&mut self, entries: E) {
        self.entries = entries;
    }
}
