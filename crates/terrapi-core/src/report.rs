//! Progress reporting.
//!
//! The core never prints. Callers pass a [`Reporter`] into the assembler and
//! decide how events reach the user.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::layout::{Provider, Step, TemplateStyle};

/// Something that happened during assembly. File paths are relative to the
/// project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started {
        target: PathBuf,
        style: TemplateStyle,
        provider: Provider,
    },
    PassStarted {
        step: Step,
        source: String,
        target: PathBuf,
    },
    FileWritten {
        path: PathBuf,
    },
    FileFailed {
        path: PathBuf,
        cause: String,
    },
    Finished {
        written: usize,
        failed: usize,
    },
}

/// Receives assembly events.
pub trait Reporter {
    fn report(&self, event: &Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &Event) {}
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<Event>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
