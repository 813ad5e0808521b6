//! # journalnav
//!
//! Page-state navigation for a single-page journal viewer.
//!
//! ## Architecture
//! - **PageDescriptor**: home, a single entry, or settings
//! - **ViewPort**: the surface the navigator writes title, modes, entry view and history to
//! - **Navigator**: maps a descriptor onto a viewport, pushing history unless the
//!   change came from history itself
//! - **Dispatcher**: serialises transition requests in arrival order

#![warn(missing_docs)]

mod dispatch;
mod entry;
mod error;
mod history;
mod navigator;
mod page;
mod viewport;

pub use dispatch::{Command, Dispatcher};
pub use entry::{EntryList, EntryRecord, EntrySource};
pub use error::{Error, Result};
pub use history::{HistoryRecord, SessionHistory};
pub use navigator::Navigator;
pub use page::{EntryId, PageDescriptor, HOME_TITLE, SETTINGS_TITLE};
pub use viewport::{EntryView, MemoryViewPort, ViewPort, VisualMode};
