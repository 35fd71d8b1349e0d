// Owner of the one-daemon-at-a-time run slot.

use crate::daemon::DaemonKind;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub running: Option<DaemonKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerState {
    Ready,
    Busy,
    Disabled,
}

/// What one trigger element should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerView {
    pub daemon: DaemonKind,
    pub state: TriggerState,
    pub label: &'static str,
    pub description: &'static str,
}

impl RunSnapshot {
    pub fn trigger_state(&self, kind: DaemonKind) -> TriggerState {
        match self.running {
            None => TriggerState::Ready,
            Some(holder) if holder == kind => TriggerState::Busy,
            Some(_) => TriggerState::Disabled,
        }
    }

    pub fn triggers(&self) -> Vec<TriggerView> {
        DaemonKind::ALL
            .iter()
            .map(|&daemon| TriggerView {
                daemon,
                state: self.trigger_state(daemon),
                label: daemon.label(),
                description: daemon.description(),
            })
            .collect()
    }
}

pub struct Coordinator {
    state: watch::Sender<RunSnapshot>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunSnapshot::default());
        Self { state }
    }

    /// Claims the run slot for `kind` if nobody holds it.
    pub fn try_acquire(&self, kind: DaemonKind) -> bool {
        self.state.send_if_modified(|snapshot| {
            if snapshot.running.is_none() {
                snapshot.running = Some(kind);
                true
            } else {
                false
            }
        })
    }

    /// Frees the slot. A no-op unless `kind` holds it.
    pub fn release(&self, kind: DaemonKind) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.running == Some(kind) {
                snapshot.running = None;
                true
            } else {
                false
            }
        });
    }

    pub fn running(&self) -> Option<DaemonKind> {
        self.state.borrow().running
    }

    pub fn snapshot(&self) -> RunSnapshot {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.state.subscribe()
    }
}
