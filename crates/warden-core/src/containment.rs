//! Containment status: the monitor's self-assessed operational integrity.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Operational integrity of the monitor itself, distinct from the state of
/// the monitored processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainmentStatus {
    Active = 0,
    Compromised = 1,
    EmergencyShutdown = 2,
}

impl ContainmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainmentStatus::Active => "ACTIVE",
            ContainmentStatus::Compromised => "COMPROMISED",
            ContainmentStatus::EmergencyShutdown => "EMERGENCY_SHUTDOWN",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ContainmentStatus::Active,
            1 => ContainmentStatus::Compromised,
            _ => ContainmentStatus::EmergencyShutdown,
        }
    }
}

/// Shared, lock-free cell holding the containment status.
///
/// Transitions are monotonic: ACTIVE -> COMPROMISED -> EMERGENCY_SHUTDOWN,
/// where COMPROMISED may be skipped. Attempts to move backwards are ignored.
#[derive(Debug, Default)]
pub struct ContainmentCell {
    raw: AtomicU8,
}

impl ContainmentCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ContainmentStatus {
        ContainmentStatus::from_u8(self.raw.load(Ordering::SeqCst))
    }

    /// Move to `status` if it is a forward transition; otherwise keep the
    /// current value.
    pub fn downgrade(&self, status: ContainmentStatus) {
        let target = status as u8;
        let mut current = self.raw.load(Ordering::SeqCst);
        while current < target {
            match self.raw.compare_exchange(
                current,
                target,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    warn!(status = status.as_str(), "containment status changed");
                    return;
                }
                Err(observed) => current = observed,
            }
        }
    }
}
