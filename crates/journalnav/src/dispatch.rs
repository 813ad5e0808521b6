//! Ordered command queue feeding the navigator
//!
//! Clicks and back/forward steps become `Command`s; the dispatcher applies
//! them one at a time in arrival order.

use std::collections::VecDeque;

use tracing::warn;

use crate::entry::EntrySource;
use crate::error::Error;
use crate::navigator::Navigator;
use crate::page::PageDescriptor;
use crate::viewport::ViewPort;

/// A transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// User-initiated navigation; pushes history
    Navigate(Option<PageDescriptor>),
    /// Back/forward step carrying the stored state; never pushes history
    PopState(Option<PageDescriptor>),
}

impl Command {
    fn into_transition(self) -> (Option<PageDescriptor>, bool) {
        match self {
            Command::Navigate(page) => (page, false),
            Command::PopState(page) => (page, true),
        }
    }
}

/// FIFO of pending commands
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<Command>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command
    pub fn enqueue(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Apply the oldest pending command, if any
    pub fn dispatch_next<V, E>(
        &mut self,
        navigator: &mut Navigator<V, E>,
    ) -> Option<Result<(), Error>>
    where
        V: ViewPort,
        E: EntrySource,
    {
        let command = self.queue.pop_front()?;
        let (page, from_history) = command.into_transition();
        Some(navigator.transition(page, from_history))
    }

    /// Apply every pending command; failures are logged and returned
    ///
    /// A failing command does not stop the ones queued after it.
    pub fn dispatch_all<V, E>(&mut self, navigator: &mut Navigator<V, E>) -> Vec<Error>
    where
        V: ViewPort,
        E: EntrySource,
    {
        let mut failures = Vec::new();
        while let Some(result) = self.dispatch_next(navigator) {
            if let Err(e) = result {
                warn!("Navigation failed: {}", e);
                failures.push(e);
            }
        }
        failures
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if no command is pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
