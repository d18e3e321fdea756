//! Learned resource baselines and behavior windows.
//!
//! Baselines are keyed by process name, not PID -- PIDs are ephemeral and a
//! respawned module should inherit its learned profile. A baseline is never
//! destroyed; the map is bounded indirectly by the distinct process-name
//! cardinality of the host.

use std::collections::{HashMap, VecDeque};

use chrono::Utc;

use warden_core::forensic::BehaviorSample;

/// Growth multiplier for capability-overhang checks.
pub const CAPABILITY_MULTIPLIER: f64 = 10.0;

/// Growth multiplier for rapid-memory-growth checks.
pub const MEMORY_GROWTH_MULTIPLIER: f64 = 5.0;

/// Samples accumulated with a plain running mean before switching to EWMA.
const BASELINE_SAMPLE_CAP: u32 = 50;

/// EWMA retention: 90% old baseline, 10% new sample.
const EWMA_RETAIN: f64 = 0.9;

/// Behavior window capacity per identity.
pub const WINDOW_CAPACITY: usize = 100;

/// Minimum samples before any behavioral verdict.
pub const MIN_SAMPLES: usize = 10;

/// CPU variance over the recent window above which behavior is inconsistent.
pub const VARIANCE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone)]
struct ResourceBaseline {
    cpu_avg: f64,
    mem_avg: f64,
    sample_count: u32,
}

/// Per-identity EWMA baselines with multiplicative spike detection.
#[derive(Debug, Default)]
pub struct BaselineTracker {
    baselines: HashMap<String, ResourceBaseline>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation and report whether it is a spike.
    ///
    /// The first sight of an identity records the baseline and never reports
    /// a spike. A zero baseline counts as growth factor 1, so a process
    /// idling at zero cannot divide its way into an alert. On a spike the
    /// baseline is left untouched -- the anomalous sample must not drag the
    /// learned profile toward it.
    pub fn observe(&mut self, identity: &str, cpu: f64, mem: f64, multiplier: f64) -> bool {
        let Some(baseline) = self.baselines.get_mut(identity) else {
            self.baselines.insert(
                identity.to_string(),
                ResourceBaseline {
                    cpu_avg: cpu,
                    mem_avg: mem,
                    sample_count: 1,
                },
            );
            return false;
        };

        let cpu_growth = growth_factor(cpu, baseline.cpu_avg);
        let mem_growth = growth_factor(mem, baseline.mem_avg);
        if cpu_growth > multiplier || mem_growth > multiplier {
            return true;
        }

        if baseline.sample_count < BASELINE_SAMPLE_CAP {
            let count = f64::from(baseline.sample_count);
            baseline.cpu_avg = (baseline.cpu_avg * count + cpu) / (count + 1.0);
            baseline.mem_avg = (baseline.mem_avg * count + mem) / (count + 1.0);
            baseline.sample_count += 1;
        } else {
            baseline.cpu_avg = baseline.cpu_avg * EWMA_RETAIN + cpu * (1.0 - EWMA_RETAIN);
            baseline.mem_avg = baseline.mem_avg * EWMA_RETAIN + mem * (1.0 - EWMA_RETAIN);
        }
        false
    }
}

fn growth_factor(current: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        1.0
    } else {
        current / baseline
    }
}

/// Bounded sliding windows of recent behavior samples per identity.
#[derive(Debug, Default)]
pub struct BehaviorHistory {
    windows: HashMap<String, VecDeque<BehaviorSample>>,
}

impl BehaviorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, evicting the oldest once the window is full.
    pub fn push(&mut self, identity: &str, cpu_percent: f32, memory_rss: u64) {
        let window = self.windows.entry(identity.to_string()).or_default();
        if window.len() == WINDOW_CAPACITY {
            window.pop_front();
        }
        window.push_back(BehaviorSample {
            cpu_percent,
            memory_rss,
            timestamp: Utc::now(),
        });
    }

    /// Variance of the last [`MIN_SAMPLES`] CPU observations.
    ///
    /// Returns `None` while fewer than [`MIN_SAMPLES`] samples exist: cold
    /// start means no verdict, not "normal".
    pub fn recent_cpu_variance(&self, identity: &str) -> Option<f64> {
        let window = self.windows.get(identity)?;
        if window.len() < MIN_SAMPLES {
            return None;
        }
        let recent: Vec<f64> = window
            .iter()
            .rev()
            .take(MIN_SAMPLES)
            .map(|s| f64::from(s.cpu_percent))
            .collect();
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let variance =
            recent.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / recent.len() as f64;
        Some(variance)
    }

    /// Identities with at least one recorded sample.
    pub fn identities(&self) -> Vec<String> {
        self.windows.keys().cloned().collect()
    }

    /// Owned copy of every window, for the forensic snapshot.
    pub fn export(&self) -> HashMap<String, Vec<BehaviorSample>> {
        self.windows
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect()
    }
}
