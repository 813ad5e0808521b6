//! The view surface the navigator drives
//!
//! `ViewPort` stands in for the document and history globals of a page so
//! the navigator can run against any surface, including the in-memory one
//! used by tests and the terminal app.

use bitflags::bitflags;

use crate::entry::EntryRecord;
use crate::history::{HistoryRecord, SessionHistory};
use crate::page::{EntryId, HOME_TITLE};

bitflags! {
    /// Page-level display modes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VisualMode: u8 {
        /// Single entry view is shown instead of the list
        const SINGLE_ENTRY = 1 << 0;
        /// Settings placeholder is shown
        const SETTINGS     = 1 << 1;
    }
}

/// Capability the navigator mutates
pub trait ViewPort {
    /// Replace the header title
    fn set_title(&mut self, title: &str);

    /// Replace the active display modes
    fn set_visual_mode(&mut self, mode: VisualMode);

    /// Drop the current single-entry view and build a new one from `entry`
    fn replace_entry_view(&mut self, id: EntryId, entry: &EntryRecord);

    /// Append a record to session history
    fn push_history(&mut self, record: HistoryRecord);
}

/// A single-entry view
#[derive(Debug, Clone, PartialEq)]
pub struct EntryView {
    /// Entry shown
    pub id: EntryId,
    /// Data the view was built from
    pub entry: EntryRecord,
    /// Distinct for every view ever built on a viewport
    pub generation: u64,
}

/// In-memory viewport that records everything it is told
#[derive(Debug, Clone)]
pub struct MemoryViewPort {
    title: String,
    mode: VisualMode,
    entry_view: Option<EntryView>,
    views_built: u64,
    history: SessionHistory,
}

impl MemoryViewPort {
    /// Fresh document loaded at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: HOME_TITLE.to_string(),
            mode: VisualMode::empty(),
            entry_view: None,
            views_built: 0,
            history: SessionHistory::new(url),
        }
    }

    /// Current header title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current display modes
    pub fn mode(&self) -> VisualMode {
        self.mode
    }

    /// Current single-entry view, if one was ever built
    pub fn entry_view(&self) -> Option<&EntryView> {
        self.entry_view.as_ref()
    }

    /// Number of single-entry views built so far
    pub fn views_built(&self) -> u64 {
        self.views_built
    }

    /// Session history
    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Session history, for back/forward
    pub fn history_mut(&mut self) -> &mut SessionHistory {
        &mut self.history
    }
}

impl ViewPort for MemoryViewPort {
    fn set_title(&mut self, title: &str) {
        self.title.clear();
        self.title.push_str(title);
    }

    fn set_visual_mode(&mut self, mode: VisualMode) {
        self.mode = mode;
    }

    fn replace_entry_view(&mut self, id: EntryId, entry: &EntryRecord) {
        self.entry_view = None;
        self.views_built += 1;
        self.entry_view = Some(EntryView {
            id,
            entry: entry.clone(),
            generation: self.views_built,
        });
    }

    fn push_history(&mut self, record: HistoryRecord) {
        self.history.push(record);
    }
}
