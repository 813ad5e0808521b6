//! Worker lifecycle states
//!
//! ```text
//! Uninstalled --on_install / resume--> Installed
//! Installed   --on_activate---------> Activated
//! Activated   --first fetch---------> Running
//! ```
//! A failed install leaves the worker Uninstalled. `resume` reaches Installed
//! from a generation already on disk, without touching the network.

use std::fmt;

/// Where the offline cache is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Nothing cached yet
    Uninstalled,
    /// Seed responses stored, not yet controlling pages
    Installed,
    /// Controlling pages, no fetch seen yet
    Activated,
    /// Intercepting fetches
    Running,
}

impl WorkerState {
    /// Whether fetches are answered from the cache in this state
    pub fn intercepts_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated | WorkerState::Running)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Uninstalled => write!(f, "uninstalled"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Running => write!(f, "running"),
        }
    }
}
