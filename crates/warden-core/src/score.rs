//! Risk score accumulation and decay.
//!
//! The score is a single non-negative scalar owned by the aggregator task;
//! all mutation funnels through this type's single-writer API. Reporting
//! reads snapshot copies published by the aggregator, never the live value.

use serde::{Deserialize, Serialize};

/// Fraction of the score retained after one minute without new events.
pub const DECAY_RATE_PER_MIN: f64 = 0.95;

/// Multiplier applied by the degradation action.
pub const DEGRADATION_FACTOR: f64 = 0.7;

/// Outcome of a threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreVerdict {
    /// Below the anomaly threshold; no action.
    Nominal,
    /// Anomaly threshold crossed; degrade capabilities, non-fatal.
    Degrade,
    /// Critical threshold crossed; emergency shutdown.
    Shutdown,
}

/// The process-wide risk accumulator.
///
/// Invariants: never negative; decays toward zero absent new events; only
/// the degradation action ever scales it down outside of decay.
#[derive(Debug)]
pub struct RiskScore {
    value: f64,
    anomaly_threshold: f64,
    critical_threshold: f64,
}

impl RiskScore {
    /// Build an accumulator with the given thresholds.
    ///
    /// The critical threshold must exceed the anomaly threshold; this is an
    /// invariant of the escalation ladder, validated at config load.
    pub fn new(anomaly_threshold: f64, critical_threshold: f64) -> Self {
        debug_assert!(critical_threshold > anomaly_threshold);
        Self {
            value: 0.0,
            anomaly_threshold,
            critical_threshold,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Add drained severity weight to the score.
    pub fn add(&mut self, severity_sum: u32) {
        self.value += f64::from(severity_sum);
    }

    /// Apply exponential decay for the elapsed wall time since the previous
    /// evaluation. Handles irregular cadence by exponentiating the per-minute
    /// rate.
    pub fn decay(&mut self, elapsed_minutes: f64) {
        if elapsed_minutes <= 0.0 {
            return;
        }
        self.value = (self.value * DECAY_RATE_PER_MIN.powf(elapsed_minutes)).max(0.0);
    }

    /// Compare the current score against the escalation thresholds.
    pub fn verdict(&self) -> ScoreVerdict {
        if self.value > self.critical_threshold {
            ScoreVerdict::Shutdown
        } else if self.value > self.anomaly_threshold {
            ScoreVerdict::Degrade
        } else {
            ScoreVerdict::Nominal
        }
    }

    /// Degradation action: scale the score down and keep running.
    ///
    /// This is the only non-decay path that lowers the score.
    pub fn degrade(&mut self) {
        self.value *= DEGRADATION_FACTOR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_same_kind_sums_linearly() {
        let mut score = RiskScore::new(10.0, 50.0);
        for _ in 0..4 {
            score.add(7);
        }
        assert_eq!(score.value(), 28.0);
    }

    #[test]
    fn scenario_two_unauthorized_one_memory() {
        let mut score = RiskScore::new(10.0, 50.0);
        score.add(5 + 5 + 3);
        score.decay(0.0);
        assert_eq!(score.value(), 13.0);
    }

    #[test]
    fn decay_strictly_decreases_toward_zero() {
        let mut score = RiskScore::new(10.0, 50.0);
        score.add(20);
        let mut prev = score.value();
        for _ in 0..50 {
            score.decay(1.0);
            let v = score.value();
            assert!(v < prev);
            assert!(v >= 0.0);
            prev = v;
        }
    }

    #[test]
    fn decay_with_zero_elapsed_is_identity() {
        let mut score = RiskScore::new(10.0, 50.0);
        score.add(13);
        score.decay(0.0);
        assert_eq!(score.value(), 13.0);
    }

    #[test]
    fn irregular_cadence_decays_by_elapsed_minutes() {
        let mut a = RiskScore::new(10.0, 50.0);
        let mut b = RiskScore::new(10.0, 50.0);
        a.add(100);
        b.add(100);
        a.decay(3.0);
        b.decay(1.0);
        b.decay(1.0);
        b.decay(1.0);
        assert!((a.value() - b.value()).abs() < 1e-9);
    }

    #[test]
    fn verdict_ladder() {
        let mut score = RiskScore::new(10.0, 50.0);
        assert_eq!(score.verdict(), ScoreVerdict::Nominal);
        score.add(15);
        assert_eq!(score.verdict(), ScoreVerdict::Degrade);
        score.add(45);
        assert_eq!(score.verdict(), ScoreVerdict::Shutdown);
    }

    #[test]
    fn critical_threshold_shutdown_at_sixty() {
        let mut score = RiskScore::new(10.0, 50.0);
        score.add(60);
        assert_eq!(score.verdict(), ScoreVerdict::Shutdown);
    }

    #[test]
    fn degradation_scales_by_seven_tenths() {
        let mut score = RiskScore::new(10.0, 50.0);
        score.add(15);
        assert_eq!(score.verdict(), ScoreVerdict::Degrade);
        score.degrade();
        assert!((score.value() - 10.5).abs() < 1e-9);
    }
}
