//! Tripwire state machine.
//!
//! A tripwire is a named boolean condition whose activation is sticky for the
//! process lifetime. Conditions are independent booleans, so each lives in
//! its own atomic and no process-wide lock is required. The
//! `shutdown_initiated` latch is set with compare-and-swap so that exactly
//! one caller wins when several loops detect a shutdown condition in the same
//! instant.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::error;

/// The fixed enumeration of tripwire conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tripwire {
    CapabilityExplosion,
    GoalModification,
    DeceptiveBehavior,
    ContainmentBreach,
    InterpretabilityFailure,
}

impl Tripwire {
    pub const ALL: [Tripwire; 5] = [
        Tripwire::CapabilityExplosion,
        Tripwire::GoalModification,
        Tripwire::DeceptiveBehavior,
        Tripwire::ContainmentBreach,
        Tripwire::InterpretabilityFailure,
    ];

    /// Conditions that warrant shutdown on their own.
    pub const CRITICAL: [Tripwire; 3] = [
        Tripwire::CapabilityExplosion,
        Tripwire::GoalModification,
        Tripwire::ContainmentBreach,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tripwire::CapabilityExplosion => "capability_explosion",
            Tripwire::GoalModification => "goal_modification",
            Tripwire::DeceptiveBehavior => "deceptive_behavior",
            Tripwire::ContainmentBreach => "containment_breach",
            Tripwire::InterpretabilityFailure => "interpretability_failure",
        }
    }
}

/// Sticky boolean conditions shared by every monitor loop.
///
/// No condition is ever unset during a run, and `shutdown_initiated` is
/// permanent for the process lifetime.
#[derive(Debug, Default)]
pub struct TripwireSet {
    capability_explosion: AtomicBool,
    goal_modification: AtomicBool,
    deceptive_behavior: AtomicBool,
    containment_breach: AtomicBool,
    interpretability_failure: AtomicBool,
    shutdown_initiated: AtomicBool,
}

impl TripwireSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, tripwire: Tripwire) -> &AtomicBool {
        match tripwire {
            Tripwire::CapabilityExplosion => &self.capability_explosion,
            Tripwire::GoalModification => &self.goal_modification,
            Tripwire::DeceptiveBehavior => &self.deceptive_behavior,
            Tripwire::ContainmentBreach => &self.containment_breach,
            Tripwire::InterpretabilityFailure => &self.interpretability_failure,
        }
    }

    /// Activate a tripwire. Logs on the first activation only.
    pub fn set(&self, tripwire: Tripwire) {
        if !self.cell(tripwire).swap(true, Ordering::SeqCst) {
            error!(tripwire = tripwire.name(), "TRIPWIRE ACTIVATED");
        }
    }

    pub fn is_set(&self, tripwire: Tripwire) -> bool {
        self.cell(tripwire).load(Ordering::SeqCst)
    }

    /// Count of currently active conditions.
    pub fn active_count(&self) -> usize {
        Tripwire::ALL.iter().filter(|t| self.is_set(**t)).count()
    }

    /// Names of currently active conditions, for reporting and forensics.
    pub fn active(&self) -> Vec<&'static str> {
        Tripwire::ALL
            .iter()
            .copied()
            .filter(|t| self.is_set(*t))
            .map(Tripwire::name)
            .collect()
    }

    /// Whether shutdown is warranted by tripwire state alone.
    ///
    /// True if any critical condition is set, or if two or more conditions of
    /// any kind are set. Two simultaneous minor trips are treated as
    /// seriously as one major trip.
    pub fn evaluate(&self) -> bool {
        if Tripwire::CRITICAL.iter().any(|t| self.is_set(*t)) {
            return true;
        }
        self.active_count() >= 2
    }

    /// Claim the one-shot shutdown latch.
    ///
    /// Returns true for exactly one caller per process lifetime.
    pub fn claim_shutdown(&self) -> bool {
        self.shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }
}
