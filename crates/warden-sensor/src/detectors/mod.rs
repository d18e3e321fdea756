//! The heuristic detector family.
//!
//! Every detector produces a [`Detection`]: zero or more typed anomaly
//! events plus any tripwires the observation warrants. Detectors hold their
//! own private state, treat "no data yet" as a non-alerting condition, and
//! never panic on malformed input -- they report empty results instead.

pub mod alignment;
pub mod capability;
pub mod classifier;
pub mod consistency;
pub mod entropy;
pub mod logpattern;
pub mod memory;

pub use alignment::AlignmentScorer;
pub use capability::CapabilityMonitor;
pub use classifier::{Classification, ProcessClassifier};
pub use consistency::check_consistency;
pub use entropy::ContainmentVerifier;
pub use logpattern::LogPatternDetector;
pub use memory::MemoryPatternDetector;

use warden_core::{AnomalyEvent, Tripwire};

/// The uniform result of one detector invocation.
#[derive(Debug, Default)]
pub struct Detection {
    pub events: Vec<AnomalyEvent>,
    pub tripwires: Vec<Tripwire>,
}

impl Detection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.tripwires.is_empty()
    }

    /// Fold another detection into this one.
    pub fn merge(&mut self, other: Detection) {
        self.events.extend(other.events);
        self.tripwires.extend(other.tripwires);
    }
}
