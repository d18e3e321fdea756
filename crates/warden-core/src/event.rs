//! Anomaly events and the severity table.
//!
//! Events are the fundamental data unit flowing through warden. Every
//! detector invocation produces zero or more [`AnomalyEvent`]s, which travel
//! over a single channel to the score aggregator and are consumed exactly
//! once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weight applied to kinds without a dedicated entry in the severity table.
pub const DEFAULT_WEIGHT: u32 = 2;

/// The category of a suspicious observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A kernel thread not covered by the prefix whitelist.
    KernelThread,
    /// A process that matched no allow rule.
    UnauthorizedProcess,
    /// An unauthorized process whose command line contains sensitive keywords.
    UnauthorizedSensitiveProcess,
    /// Resource usage jumped an order of magnitude over the learned baseline.
    CapabilityExplosion,
    /// Optimization-heavy command line suggesting an embedded optimizer.
    MesaOptimizer,
    /// Behavioral variance beyond what a consistent process exhibits.
    DeceptiveBehavior,
    /// Memory growth or allocation pattern anomaly.
    MemoryAnomaly,
    /// Output entropy exceeded the containment bound relative to input.
    OracleViolation,
    /// A log line matched a known anomaly signature.
    LogAnomaly,
    /// Goal-related vocabulary density crossed the modification threshold.
    GoalModification,
    /// Decision/reasoning lines fell below the transparency floor.
    InterpretabilityFailure,
    /// Rolling value-alignment mean dropped below the acceptance floor.
    LowAlignment,
    /// Host-wide CPU or memory pressure near saturation.
    HighResourceUsage,
    /// A monitor loop iteration failed; counted as a generic low-level signal.
    MonitoringError,
}

impl AnomalyKind {
    /// Static severity weight for this kind.
    ///
    /// Kinds without a dedicated weight fall back to [`DEFAULT_WEIGHT`]
    /// rather than failing, so adding a detector can never break aggregation.
    pub fn weight(self) -> u32 {
        match self {
            AnomalyKind::KernelThread => 1,
            AnomalyKind::UnauthorizedProcess => 5,
            AnomalyKind::UnauthorizedSensitiveProcess => 8,
            AnomalyKind::CapabilityExplosion => 10,
            AnomalyKind::MesaOptimizer => 7,
            AnomalyKind::DeceptiveBehavior => 8,
            AnomalyKind::MemoryAnomaly => 3,
            AnomalyKind::OracleViolation => 6,
            AnomalyKind::LogAnomaly
            | AnomalyKind::GoalModification
            | AnomalyKind::InterpretabilityFailure
            | AnomalyKind::LowAlignment
            | AnomalyKind::HighResourceUsage
            | AnomalyKind::MonitoringError => DEFAULT_WEIGHT,
        }
    }
}

/// A typed, severity-weighted signal emitted by a detector.
///
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub kind: AnomalyKind,
    pub severity: u32,
    /// Which detector or loop produced this event.
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl AnomalyEvent {
    /// Create an event with the table weight for `kind`.
    pub fn new(kind: AnomalyKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.weight(),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_weights_match_policy() {
        assert_eq!(AnomalyKind::KernelThread.weight(), 1);
        assert_eq!(AnomalyKind::UnauthorizedProcess.weight(), 5);
        assert_eq!(AnomalyKind::MemoryAnomaly.weight(), 3);
        assert_eq!(AnomalyKind::CapabilityExplosion.weight(), 10);
    }

    #[test]
    fn sensitive_process_outweighs_plain_unauthorized() {
        assert!(
            AnomalyKind::UnauthorizedSensitiveProcess.weight()
                > AnomalyKind::UnauthorizedProcess.weight()
        );
    }

    #[test]
    fn unlisted_kinds_use_default_weight() {
        assert_eq!(AnomalyKind::LogAnomaly.weight(), DEFAULT_WEIGHT);
        assert_eq!(AnomalyKind::MonitoringError.weight(), DEFAULT_WEIGHT);
        assert_eq!(AnomalyKind::GoalModification.weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn event_new_uses_table_weight() {
        let event = AnomalyEvent::new(AnomalyKind::MesaOptimizer, "proc-monitor");
        assert_eq!(event.severity, 7);
        assert_eq!(event.source, "proc-monitor");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&AnomalyKind::CapabilityExplosion).unwrap();
        assert_eq!(json, "\"capability_explosion\"");
    }
}
