use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Dispatching,
    Running,
    Draining,
}

/// Single owner of "is a run in progress". Only one [`RunTicket`] exists at a time.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    phase: Arc<Mutex<RunPhase>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        *self.lock()
    }

    /// `Idle -> Dispatching`. Returns `None` when a run is already active.
    pub fn try_begin(&self) -> Option<RunTicket> {
        let mut phase = self.lock();
        if *phase != RunPhase::Idle {
            return None;
        }
        *phase = RunPhase::Dispatching;
        Some(RunTicket {
            state: self.clone(),
        })
    }

    /// Moves an active run forward. Ignored once the run has ended.
    pub(crate) fn advance(&self, next: RunPhase) {
        let mut phase = self.lock();
        if *phase != RunPhase::Idle {
            *phase = next;
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of an active run. Dropping it returns the state to `Idle`.
#[derive(Debug)]
pub struct RunTicket {
    state: RunState,
}

impl RunTicket {
    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        *self.state.lock() = RunPhase::Idle;
    }
}
