//! Memory-pattern detection.
//!
//! Rapid growth is judged against the learned memory baseline with the 5x
//! multiplier. The remaining sub-checks are extension points: they report
//! "not detected" until a real heuristic replaces them.

use tracing::warn;

use warden_core::{AnomalyEvent, AnomalyKind};

use crate::baseline::{BaselineTracker, MEMORY_GROWTH_MULTIPLIER};
use crate::procscan::ProcessRecord;

use super::Detection;

/// Watches watched-module memory behavior.
pub struct MemoryPatternDetector {
    baselines: BaselineTracker,
}

impl MemoryPatternDetector {
    pub fn new() -> Self {
        Self {
            baselines: BaselineTracker::new(),
        }
    }

    pub fn evaluate(&mut self, record: &ProcessRecord) -> Detection {
        let mut detection = Detection::none();

        let rapid_growth = self.baselines.observe(
            &record.name,
            0.0,
            record.memory_rss as f64,
            MEMORY_GROWTH_MULTIPLIER,
        );
        if rapid_growth {
            warn!(process = %record.name, memory = record.memory_rss, "rapid memory growth");
        }

        for detected in [
            rapid_growth,
            unusual_allocation_pattern(record),
            state_corruption(record),
        ] {
            if detected {
                detection
                    .events
                    .push(AnomalyEvent::new(AnomalyKind::MemoryAnomaly, "memory-monitor"));
            }
        }
        detection
    }
}

impl Default for MemoryPatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension point: allocation-pattern analysis is not implemented.
fn unusual_allocation_pattern(_record: &ProcessRecord) -> bool {
    false
}

/// Extension point: state-corruption analysis is not implemented.
fn state_corruption(_record: &ProcessRecord) -> bool {
    false
}
