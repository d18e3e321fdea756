//! Information-theoretic containment verification.
//!
//! Treats the monitored framework as an oracle: the information it emits
//! should be bounded by the information it receives. Output entropy far in
//! excess of input entropy suggests a covert channel or leakage.

use tracing::warn;

use warden_core::{AnomalyEvent, AnomalyKind};

use super::Detection;

/// Output entropy above `input * LEAKAGE_MULTIPLIER` is a violation.
pub const LEAKAGE_MULTIPLIER: f64 = 2.0;

/// One sampled input/output entropy pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyPair {
    pub input: f64,
    pub output: f64,
}

/// Verifies containment over entropy samples, keeping a running violation
/// count for reporting.
#[derive(Debug, Default)]
pub struct ContainmentVerifier {
    violations: u64,
}

impl ContainmentVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one entropy pair; a violation emits `oracle_violation`.
    pub fn verify(&mut self, pair: EntropyPair) -> Detection {
        let mut detection = Detection::none();
        if pair.output > pair.input * LEAKAGE_MULTIPLIER {
            self.violations += 1;
            warn!(
                input = pair.input,
                output = pair.output,
                total = self.violations,
                "information leakage past containment boundary"
            );
            detection
                .events
                .push(AnomalyEvent::new(AnomalyKind::OracleViolation, "containment-verifier"));
        }
        detection
    }

    pub fn violation_count(&self) -> u64 {
        self.violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_output_passes() {
        let mut verifier = ContainmentVerifier::new();
        let detection = verifier.verify(EntropyPair { input: 3.0, output: 5.9 });
        assert!(detection.is_empty());
        assert_eq!(verifier.violation_count(), 0);
    }

    #[test]
    fn exactly_double_output_passes() {
        let mut verifier = ContainmentVerifier::new();
        assert!(verifier
            .verify(EntropyPair { input: 2.5, output: 5.0 })
            .is_empty());
    }

    #[test]
    fn leakage_emits_oracle_violation() {
        let mut verifier = ContainmentVerifier::new();
        let detection = verifier.verify(EntropyPair { input: 1.0, output: 2.1 });
        assert_eq!(detection.events.len(), 1);
        assert_eq!(detection.events[0].kind, AnomalyKind::OracleViolation);
        assert!(detection.tripwires.is_empty());
        assert_eq!(verifier.violation_count(), 1);
    }

    #[test]
    fn zero_input_with_any_output_is_leakage() {
        let mut verifier = ContainmentVerifier::new();
        assert!(!verifier
            .verify(EntropyPair { input: 0.0, output: 0.1 })
            .is_empty());
    }
}
