//! Journal entry records, as served by the entries endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::page::EntryId;

/// One journal entry
///
/// Only `title`, `date` and `content` are interpreted; every other field
/// (image, audio, ...) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Entry title
    #[serde(default)]
    pub title: String,

    /// Display date, free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Entry body
    #[serde(default)]
    pub content: String,

    /// Fields the navigator does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntryRecord {
    /// Create a record with just a title and body
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Lookup of entry data by identifier
pub trait EntrySource {
    /// Entry data for `id`, if any
    fn entry(&self, id: EntryId) -> Option<&EntryRecord>;
}

/// Entries in the order the endpoint returned them; entry `n` sits at `n - 1`
#[derive(Debug, Clone, Default)]
pub struct EntryList {
    entries: Vec<EntryRecord>,
}

impl EntryList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON array returned by the entries endpoint
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let entries: Vec<EntryRecord> = serde_json::from_slice(body)?;
        Ok(Self { entries })
    }

    /// Append an entry, returning its identifier
    pub fn push(&mut self, entry: EntryRecord) -> EntryId {
        self.entries.push(entry);
        EntryId::from_index(self.entries.len() - 1)
    }

    /// Iterate `(id, entry)` pairs in list order
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &EntryRecord)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (EntryId::from_index(i), e))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntrySource for EntryList {
    fn entry(&self, id: EntryId) -> Option<&EntryRecord> {
        self.entries.get(id.index())
    }
}

impl FromIterator<EntryRecord> for EntryList {
    fn from_iter<I: IntoIterator<Item = EntryRecord>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
