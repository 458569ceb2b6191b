// ActionGate - at most one remote-backed action per recording at a time

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;

/// Action holding a recording's gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Transcribe,
    ManualTranscript,
    Summarize,
    ExtractTodos,
    Rename,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Transcribe => "transcription",
            Action::ManualTranscript => "transcript edit",
            Action::Summarize => "summarization",
            Action::ExtractTodos => "to-do extraction",
            Action::Rename => "rename",
            Action::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// Per-identity mutual exclusion for recording actions
///
/// A second action on the same recording is rejected with `Busy` rather than
/// queued. Different recordings never block each other.
#[derive(Default)]
pub struct ActionGate {
    in_flight: Arc<DashMap<String, Action>>,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for `action` until the returned guard is dropped
    pub fn try_acquire(&self, id: &str, action: Action) -> Result<GateGuard, AppError> {
        match self.in_flight.entry(id.to_string()) {
            Entry::Occupied(current) => Err(AppError::Busy {
                id: id.to_string(),
                action: current.get().to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(action);
                Ok(GateGuard {
                    in_flight: self.in_flight.clone(),
                    id: id.to_string(),
                })
            }
        }
    }

    /// Action currently running for `id`, if any
    pub fn current(&self, id: &str) -> Option<Action> {
        self.in_flight.get(id).map(|a| *a)
    }
}

/// Releases the recording when dropped, including on error and cancellation
pub struct GateGuard {
    in_flight: Arc<DashMap<String, Action>>,
    id: String,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}
