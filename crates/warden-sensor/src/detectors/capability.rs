//! Capability-overhang and mesa-pattern detection.

use tracing::warn;

use warden_core::{AnomalyEvent, AnomalyKind, Tripwire};

use crate::baseline::{BaselineTracker, CAPABILITY_MULTIPLIER};
use crate::procscan::ProcessRecord;

use super::Detection;

/// Optimization-related terms whose accumulation in a command line suggests
/// an embedded optimization process.
const MESA_PATTERNS: &[&str] = &[
    "optimization",
    "gradient",
    "loss",
    "objective",
    "maximize",
    "minimize",
];

/// Distinct mesa-pattern hits required before alerting.
const MESA_PATTERN_THRESHOLD: usize = 3;

/// Watches for sudden capability increases against learned baselines.
pub struct CapabilityMonitor {
    baselines: BaselineTracker,
}

impl CapabilityMonitor {
    pub fn new() -> Self {
        Self {
            baselines: BaselineTracker::new(),
        }
    }

    /// Evaluate a watched module's resource usage and command line.
    pub fn evaluate(&mut self, record: &ProcessRecord) -> Detection {
        let mut detection = Detection::none();

        if self.baselines.observe(
            &record.name,
            f64::from(record.cpu_percent),
            record.memory_rss as f64,
            CAPABILITY_MULTIPLIER,
        ) {
            warn!(
                process = %record.name,
                cpu = record.cpu_percent,
                memory = record.memory_rss,
                "capability overhang detected"
            );
            detection
                .events
                .push(AnomalyEvent::new(AnomalyKind::CapabilityExplosion, "capability-monitor"));
            detection.tripwires.push(Tripwire::CapabilityExplosion);
        }

        if mesa_pattern_count(&record.cmdline_lower()) >= MESA_PATTERN_THRESHOLD {
            warn!(process = %record.name, "mesa-optimizer pattern in command line");
            detection
                .events
                .push(AnomalyEvent::new(AnomalyKind::MesaOptimizer, "capability-monitor"));
        }

        detection
    }
}

impl Default for CapabilityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn mesa_pattern_count(cmdline: &str) -> usize {
    MESA_PATTERNS
        .iter()
        .filter(|pattern| cmdline.contains(**pattern))
        .count()
}
