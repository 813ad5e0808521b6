//! Session history: the back/forward stack of page states

use serde::{Deserialize, Serialize};

use crate::page::PageDescriptor;

/// A page state stored in session history together with its URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// State object; `None` for the document's initial entry
    pub state: Option<PageDescriptor>,
    /// URL shown while this record is current
    pub url: String,
}

impl HistoryRecord {
    /// Record for `page` under `origin`
    pub fn new(page: PageDescriptor, origin: &str) -> Self {
        Self {
            url: page.url(origin),
            state: Some(page),
        }
    }

    /// The initial entry of a freshly loaded document
    pub fn initial(url: impl Into<String>) -> Self {
        Self {
            state: None,
            url: url.into(),
        }
    }

    /// Page this record stands for
    ///
    /// A record without state (the initial entry) falls back to its URL
    /// fragment, so a document opened at `#entry3` returns to entry 3.
    pub fn page(&self) -> Option<PageDescriptor> {
        self.state.or_else(|| PageDescriptor::from_url(&self.url).ok())
    }
}

/// Ordered session history with a cursor on the current record
///
/// Pushing drops every record after the cursor. Moving back or forward
/// never modifies a record.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    records: Vec<HistoryRecord>,
    cursor: usize,
    pushes: u64,
}

impl SessionHistory {
    /// History of a document loaded at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            records: vec![HistoryRecord::initial(url)],
            cursor: 0,
            pushes: 0,
        }
    }

    /// Add a record after the current one and make it current
    pub fn push(&mut self, record: HistoryRecord) {
        self.records.truncate(self.cursor + 1);
        self.records.push(record);
        self.cursor = self.records.len() - 1;
        self.pushes += 1;
    }

    /// Step back; returns the record a popstate would deliver
    pub fn back(&mut self) -> Option<&HistoryRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.records.get(self.cursor)
    }

    /// Step forward; returns the record a popstate would deliver
    pub fn forward(&mut self) -> Option<&HistoryRecord> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        self.cursor += 1;
        self.records.get(self.cursor)
    }

    /// Current record
    pub fn current(&self) -> &HistoryRecord {
        &self.records[self.cursor]
    }

    /// URL of the current record
    pub fn location(&self) -> &str {
        &self.current().url
    }

    /// All records, oldest first
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Index of the current record
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of pushes since creation
    pub fn push_count(&self) -> u64 {
        self.pushes
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: a document has at least its initial record
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
