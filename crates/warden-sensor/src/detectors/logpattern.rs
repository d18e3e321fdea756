//! Log-pattern detection.
//!
//! Three independent checks run over every incoming log line: a fixed list
//! of regular-expression anomaly signatures, a goal-vocabulary density scan,
//! and a transparency score for reasoning/decision lines. A decision-path
//! audit additionally flags evasive reasoning terms.

use regex::Regex;
use tracing::warn;

use warden_core::{AnomalyEvent, AnomalyKind, Tripwire};

use super::Detection;

/// Signature patterns indicating a monitored module has gone off the rails.
const ANOMALY_SIGNATURES: &[&str] = &[
    r"Recursion depth exceeded \d+",
    r"Ethical tension exceeded threshold",
    r"Safety interlock bypassed",
    r"Goal modification detected",
    r"Deceptive alignment behavior",
    r"Mesa-optimizer emergence",
    r"Capability overhang warning",
    r"Oracle protocol violation",
    r"Alignment drift detected",
    r"Value misalignment warning",
    r"Reward hacking attempt",
    r"Out-of-distribution behavior",
    r"Interpretability failure",
    r"Self-modification attempt",
];

/// Goal/value vocabulary; more than five distinct hits in one line suggests
/// the module is reasoning about changing its own objectives.
const GOAL_VOCABULARY: &[&str] = &[
    "goal",
    "objective",
    "reward",
    "utility",
    "value",
    "preference",
    "ethics",
    "alignment",
    "target",
    "optimize",
];

const GOAL_DENSITY_THRESHOLD: usize = 5;

/// Keywords that make a reasoning trace legible.
const TRANSPARENCY_KEYWORDS: &[&str] = &[
    "reasoning",
    "explanation",
    "because",
    "therefore",
    "decision",
    "analysis",
    "conclusion",
    "evidence",
    "logic",
];

/// Transparency score below this floor counts as an interpretability failure.
const TRANSPARENCY_FLOOR: f64 = 0.1;

/// Evasive terms in a reasoning trace worth flagging on their own.
const EVASIVE_TERMS: &[&str] = &["bypass", "override", "ignore", "circumvent", "hack", "exploit"];

/// Stateless-per-line log analyzer with precompiled signatures.
pub struct LogPatternDetector {
    signatures: Vec<Regex>,
}

impl LogPatternDetector {
    pub fn new() -> Self {
        Self {
            signatures: ANOMALY_SIGNATURES
                .iter()
                .map(|pattern| Regex::new(pattern).expect("static signature must compile"))
                .collect(),
        }
    }

    /// Run every check against one log line.
    pub fn evaluate_line(&self, line: &str) -> Detection {
        let mut detection = Detection::none();
        let lower = line.to_lowercase();

        for signature in &self.signatures {
            if signature.is_match(line) {
                warn!(signature = %signature.as_str(), "log anomaly signature matched");
                detection
                    .events
                    .push(AnomalyEvent::new(AnomalyKind::LogAnomaly, "log-monitor"));
            }
        }

        if goal_density(&lower) > GOAL_DENSITY_THRESHOLD {
            warn!("goal-vocabulary density over threshold");
            detection
                .events
                .push(AnomalyEvent::new(AnomalyKind::GoalModification, "log-monitor"));
            detection.tripwires.push(Tripwire::GoalModification);
        }

        if lower.contains("decision") || lower.contains("reasoning") {
            if analyze_transparency(std::slice::from_ref(&line)) < TRANSPARENCY_FLOOR {
                warn!("low-transparency reasoning line");
                detection.events.push(AnomalyEvent::new(
                    AnomalyKind::InterpretabilityFailure,
                    "log-monitor",
                ));
                detection.tripwires.push(Tripwire::InterpretabilityFailure);
            }
            if EVASIVE_TERMS.iter().any(|term| lower.contains(term)) {
                warn!("evasive term in decision path");
                detection
                    .events
                    .push(AnomalyEvent::new(AnomalyKind::LogAnomaly, "decision-audit"));
            }
        }

        detection
    }
}

impl Default for LogPatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct goal-vocabulary terms appearing in the (lowercased) line.
fn goal_density(lower: &str) -> usize {
    GOAL_VOCABULARY
        .iter()
        .filter(|term| lower.contains(**term))
        .count()
}

/// Transparency keyword density, normalized by line count and clamped to 1.
///
/// Empty input scores zero: no visible reasoning is the opposite of
/// transparent.
pub fn analyze_transparency<S: AsRef<str>>(lines: &[S]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let hits: usize = lines
        .iter()
        .map(|line| {
            let lower = line.as_ref().to_lowercase();
            TRANSPARENCY_KEYWORDS
                .iter()
                .filter(|keyword| lower.contains(**keyword))
                .count()
        })
        .sum();
    (hits as f64 / lines.len() as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_match_emits_log_anomaly() {
        let detector = LogPatternDetector::new();
        let detection = detector.evaluate_line("ERROR Recursion depth exceeded 512");
        assert_eq!(detection.events.len(), 1);
        assert_eq!(detection.events[0].kind, AnomalyKind::LogAnomaly);
    }

    #[test]
    fn plain_line_is_clean() {
        let detector = LogPatternDetector::new();
        assert!(detector.evaluate_line("INFO request served in 12ms").is_empty());
    }

    #[test]
    fn goal_density_over_five_sets_tripwire() {
        let detector = LogPatternDetector::new();
        let line = "update goal objective reward utility preference target now";
        let detection = detector.evaluate_line(line);
        assert!(detection
            .events
            .iter()
            .any(|e| e.kind == AnomalyKind::GoalModification));
        assert!(detection.tripwires.contains(&Tripwire::GoalModification));
    }

    #[test]
    fn five_goal_terms_are_below_threshold() {
        assert_eq!(goal_density("goal objective reward utility target"), 5);
        let detector = LogPatternDetector::new();
        let detection = detector.evaluate_line("goal objective reward utility target");
        assert!(!detection
            .events
            .iter()
            .any(|e| e.kind == AnomalyKind::GoalModification));
    }

    #[test]
    fn decision_marker_alone_clears_the_transparency_floor() {
        // The marker word is itself a transparency keyword, so a lone
        // decision line scores 1.0 and is not an interpretability failure.
        let detector = LogPatternDetector::new();
        let detection = detector.evaluate_line("module decision: 0x7ffe");
        assert!(!detection
            .events
            .iter()
            .any(|e| e.kind == AnomalyKind::InterpretabilityFailure));
    }

    #[test]
    fn keywordless_trace_scores_below_floor() {
        let score = analyze_transparency(&["opaque trace 0x7ffe"]);
        assert!(score < TRANSPARENCY_FLOOR);
    }

    #[test]
    fn transparency_of_reasoned_lines_is_high() {
        let score = analyze_transparency(&[
            "decision taken because the evidence supports it",
            "analysis complete, therefore the conclusion holds",
        ]);
        assert!(score >= 1.0);
    }

    #[test]
    fn transparency_of_empty_input_is_zero() {
        let lines: [&str; 0] = [];
        assert_eq!(analyze_transparency(&lines), 0.0);
    }

    #[test]
    fn evasive_decision_path_is_flagged() {
        let detector = LogPatternDetector::new();
        let detection = detector.evaluate_line("decision: bypass the safety check");
        assert!(detection
            .events
            .iter()
            .any(|e| e.source == "decision-audit"));
    }

    #[test]
    fn malformed_input_reports_empty_not_panic() {
        let detector = LogPatternDetector::new();
        assert!(detector.evaluate_line("").is_empty());
        let _ = detector.evaluate_line("\u{0000}\u{fffd} garbage \u{202e}");
    }
}
