//! Behavioral-consistency checking.
//!
//! A consistently-behaving process shows low variance in its recent CPU
//! profile. High variance in a watched module is treated as a deceptive
//! behavior indicator.

use tracing::warn;

use warden_core::{AnomalyEvent, AnomalyKind, Tripwire};

use crate::baseline::{BehaviorHistory, VARIANCE_THRESHOLD};

use super::Detection;

/// Judge the recent behavior window of `identity`.
///
/// Below the minimum sample count there is no verdict at all -- cold start
/// must not read as "normal" or "abnormal".
pub fn check_consistency(history: &BehaviorHistory, identity: &str) -> Detection {
    let mut detection = Detection::none();
    let Some(variance) = history.recent_cpu_variance(identity) else {
        return detection;
    };
    if variance > VARIANCE_THRESHOLD {
        warn!(process = identity, variance, "behavioral inconsistency detected");
        detection
            .events
            .push(AnomalyEvent::new(AnomalyKind::DeceptiveBehavior, "consistency-monitor"));
        detection.tripwires.push(Tripwire::DeceptiveBehavior);
    }
    detection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_has_no_verdict() {
        let mut history = BehaviorHistory::new();
        for _ in 0..5 {
            history.push("Planner", 90.0, 100);
        }
        assert!(check_consistency(&history, "Planner").is_empty());
    }

    #[test]
    fn steady_behavior_is_clean() {
        let mut history = BehaviorHistory::new();
        for _ in 0..20 {
            history.push("Planner", 30.0, 100);
        }
        assert!(check_consistency(&history, "Planner").is_empty());
    }

    #[test]
    fn erratic_behavior_trips_deception() {
        let mut history = BehaviorHistory::new();
        for i in 0..20 {
            history.push("Planner", if i % 2 == 0 { 2.0 } else { 70.0 }, 100);
        }
        let detection = check_consistency(&history, "Planner");
        assert_eq!(detection.events.len(), 1);
        assert_eq!(detection.events[0].kind, AnomalyKind::DeceptiveBehavior);
        assert_eq!(detection.tripwires, vec![Tripwire::DeceptiveBehavior]);
    }
}
