//! Page descriptors and their URL fragments
//!
//! Wire shape of a descriptor, as stored in a history record:
//! ```text
//! {"page":"home"}
//! {"page":"entry","num":"3"}
//! {"page":"settings"}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Title shown on the home page
pub const HOME_TITLE: &str = "Journal Entries";

/// Title shown on the settings page
pub const SETTINGS_TITLE: &str = "Settings";

const ENTRY_FRAGMENT: &str = "entry";
const SETTINGS_FRAGMENT: &str = "settings";

/// Sequential entry identifier, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    /// Create an identifier, rejecting zero
    pub fn new(id: u32) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Raw identifier value
    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based position in the entry list
    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(EntryId::new)
            .ok_or_else(|| Error::InvalidEntryId(s.to_string()))
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct EntryIdVisitor;

impl<'de> Visitor<'de> for EntryIdVisitor {
    type Value = EntryId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a positive entry number as a string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<EntryId, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<EntryId, E> {
        u32::try_from(v)
            .ok()
            .and_then(EntryId::new)
            .ok_or_else(|| E::custom(Error::InvalidEntryId(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<EntryId, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(Error::InvalidEntryId(v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(EntryIdVisitor)
    }
}

/// Which of the three views is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "lowercase")]
pub enum PageDescriptor {
    /// Entry list
    #[default]
    Home,
    /// A single entry
    Entry {
        /// Entry being shown
        num: EntryId,
    },
    /// Settings placeholder
    Settings,
}

impl PageDescriptor {
    /// Shorthand for an entry page
    pub fn entry(num: EntryId) -> Self {
        PageDescriptor::Entry { num }
    }

    /// Header title for this page
    pub fn title(&self) -> String {
        match self {
            PageDescriptor::Home => HOME_TITLE.to_string(),
            PageDescriptor::Entry { num } => format!("Entry {}", num),
            PageDescriptor::Settings => SETTINGS_TITLE.to_string(),
        }
    }

    /// URL fragment including the leading `#`; empty for home
    pub fn fragment(&self) -> String {
        match self {
            PageDescriptor::Home => String::new(),
            PageDescriptor::Entry { num } => format!("#{}{}", ENTRY_FRAGMENT, num),
            PageDescriptor::Settings => format!("#{}", SETTINGS_FRAGMENT),
        }
    }

    /// History URL for this page under `origin`
    pub fn url(&self, origin: &str) -> String {
        format!("{}{}", origin, self.fragment())
    }

    /// Reconstruct a descriptor from a full URL or a bare fragment
    pub fn from_url(url: &str) -> Result<Self> {
        let fragment = match url.split_once('#') {
            Some((_, frag)) => frag,
            None => return Ok(PageDescriptor::Home),
        };

        if fragment.is_empty() {
            return Ok(PageDescriptor::Home);
        }
        if fragment == SETTINGS_FRAGMENT {
            return Ok(PageDescriptor::Settings);
        }
        match fragment.strip_prefix(ENTRY_FRAGMENT) {
            Some(num) => num
                .parse()
                .map(PageDescriptor::entry)
                .map_err(|_| Error::InvalidFragment(fragment.to_string())),
            None => Err(Error::InvalidFragment(fragment.to_string())),
        }
    }

    /// Parse a history state object; `null` means home
    pub fn from_state_json(state: &str) -> Result<Option<Self>> {
        Ok(serde_json::from_str(state)?)
    }
}
