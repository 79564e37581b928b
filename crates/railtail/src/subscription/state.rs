//! Supervisor state types.

use std::sync::atomic::{AtomicU32, Ordering};

/// Lifecycle state of the stream supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Not started.
    Idle,
    /// Dialing and handshaking a new epoch.
    Connecting,
    /// Subscription established, records flowing.
    Streaming,
    /// The current epoch failed; a new one follows.
    Faulted,
    /// Cancelled or the sink closed. Terminal.
    Stopped,
}

/// Atomic wrapper for supervisor state.
#[derive(Debug)]
pub struct AtomicSupervisorState(AtomicU32);

impl AtomicSupervisorState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: SupervisorState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> SupervisorState {
        match self.0.load(Ordering::SeqCst) {
            0 => SupervisorState::Idle,
            1 => SupervisorState::Connecting,
            2 => SupervisorState::Streaming,
            3 => SupervisorState::Faulted,
            _ => SupervisorState::Stopped,
        }
    }

    /// Store a new state.
    pub fn store(&self, state: SupervisorState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }
}
