//! Forensic snapshot persisted during emergency shutdown.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::containment::ContainmentStatus;
use crate::event::AnomalyEvent;

/// One resource observation of a monitored process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSample {
    pub cpu_percent: f32,
    pub memory_rss: u64,
    pub timestamp: DateTime<Utc>,
}

/// Everything an investigator needs after the fact, in one record.
///
/// Written as pretty-printed JSON so snapshots from different incidents can
/// be diffed directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicSnapshot {
    pub timestamp: DateTime<Utc>,
    pub shutdown_reason: String,
    pub risk_score: f64,
    pub tripwire_states: HashMap<String, bool>,
    pub behavioral_history: HashMap<String, Vec<BehaviorSample>>,
    pub security_incidents: Vec<AnomalyEvent>,
    pub alignment_score: f64,
    pub containment_status: ContainmentStatus,
}

impl ForensicSnapshot {
    /// Write the snapshot to `path`, creating parent directories as needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating forensic dir: {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("serializing forensic snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing forensic snapshot: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AnomalyKind;
    use tempfile::TempDir;

    fn sample_snapshot() -> ForensicSnapshot {
        let mut tripwires = HashMap::new();
        tripwires.insert("capability_explosion".to_string(), true);
        tripwires.insert("goal_modification".to_string(), false);

        let mut history = HashMap::new();
        history.insert(
            "CortexRunner".to_string(),
            vec![BehaviorSample {
                cpu_percent: 12.5,
                memory_rss: 4096,
                timestamp: Utc::now(),
            }],
        );

        ForensicSnapshot {
            timestamp: Utc::now(),
            shutdown_reason: "TRIPWIRE_ACTIVATED".to_string(),
            risk_score: 61.5,
            tripwire_states: tripwires,
            behavioral_history: history,
            security_incidents: vec![AnomalyEvent::new(
                AnomalyKind::CapabilityExplosion,
                "proc-monitor",
            )],
            alignment_score: 0.42,
            containment_status: ContainmentStatus::EmergencyShutdown,
        }
    }

    #[test]
    fn persist_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forensics/state.json");
        sample_snapshot().persist(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        // Pretty output is multi-line, which is what makes snapshots diffable.
        assert!(raw.lines().count() > 10);

        let parsed: ForensicSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.shutdown_reason, "TRIPWIRE_ACTIVATED");
        assert_eq!(parsed.containment_status, ContainmentStatus::EmergencyShutdown);
        assert_eq!(parsed.security_incidents.len(), 1);
    }

    #[test]
    fn persist_to_unwritable_path_fails() {
        let snapshot = sample_snapshot();
        assert!(snapshot.persist("/proc/warden-cannot-write-here").is_err());
    }
}
