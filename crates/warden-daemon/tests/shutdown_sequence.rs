//! The shutdown sequencer's at-most-once contract, exercised in-process.

use std::sync::Arc;

use tokio::sync::watch;

use warden_core::{
    AnomalyEvent, AnomalyKind, ContainmentStatus, ForensicSnapshot, Tripwire, WardenConfig,
};
use warden_daemon::shutdown::ShutdownSequencer;
use warden_daemon::MonitorState;

fn state_with_forensics(path: std::path::PathBuf) -> Arc<MonitorState> {
    let mut config = WardenConfig::default();
    config.forensic_path = path;
    Arc::new(MonitorState::new(config))
}

#[tokio::test]
async fn concurrent_triggers_run_exactly_one_sequence() {
    let dir = tempfile::TempDir::new().unwrap();
    let forensic_path = dir.path().join("forensics.json");
    let state = state_with_forensics(forensic_path.clone());
    let (_score_tx, score_rx) = watch::channel(61.5);
    let sequencer = Arc::new(ShutdownSequencer::new(Arc::clone(&state), score_rx, false));

    let mut handles = Vec::new();
    for reason in [
        "CRITICAL_ANOMALY_THRESHOLD",
        "TRIPWIRE_ACTIVATED",
        "SIGTERM",
        "SIGINT",
    ] {
        let sequencer = Arc::clone(&sequencer);
        handles.push(tokio::spawn(async move { sequencer.initiate(reason).await }));
    }
    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap() {
            wins += 1;
        }
    }

    assert_eq!(wins, 1);
    assert!(!state.is_running());
    assert!(state.tripwires.shutdown_initiated());
    assert_eq!(state.containment.get(), ContainmentStatus::EmergencyShutdown);

    let raw = std::fs::read_to_string(&forensic_path).unwrap();
    let snapshot: ForensicSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.risk_score, 61.5);
    assert_eq!(
        snapshot.containment_status,
        ContainmentStatus::EmergencyShutdown
    );
}

#[tokio::test]
async fn snapshot_captures_tripwires_and_incidents() {
    let dir = tempfile::TempDir::new().unwrap();
    let forensic_path = dir.path().join("forensics.json");
    let state = state_with_forensics(forensic_path.clone());
    let (_score_tx, score_rx) = watch::channel(12.0);

    state.tripwires.set(Tripwire::CapabilityExplosion);
    state
        .incidents
        .lock()
        .await
        .push_back(AnomalyEvent::new(AnomalyKind::CapabilityExplosion, "test"));
    state.history.lock().await.push("CortexRunner", 42.0, 8192);
    *state.alignment.lock().await = 0.25;

    let sequencer = ShutdownSequencer::new(Arc::clone(&state), score_rx, false);
    assert!(sequencer.initiate("TRIPWIRE_ACTIVATED").await);

    let raw = std::fs::read_to_string(&forensic_path).unwrap();
    let snapshot: ForensicSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.shutdown_reason, "TRIPWIRE_ACTIVATED");
    assert_eq!(snapshot.tripwire_states["capability_explosion"], true);
    assert_eq!(snapshot.tripwire_states["goal_modification"], false);
    assert_eq!(snapshot.security_incidents.len(), 1);
    assert_eq!(snapshot.behavioral_history["CortexRunner"].len(), 1);
    assert_eq!(snapshot.alignment_score, 0.25);
}

#[tokio::test]
async fn second_initiate_has_no_side_effects() {
    let dir = tempfile::TempDir::new().unwrap();
    let forensic_path = dir.path().join("forensics.json");
    let state = state_with_forensics(forensic_path.clone());
    let (_score_tx, score_rx) = watch::channel(0.0);
    let sequencer = ShutdownSequencer::new(Arc::clone(&state), score_rx, false);

    assert!(sequencer.initiate("SIGTERM").await);
    std::fs::remove_file(&forensic_path).unwrap();

    assert!(!sequencer.initiate("SIGINT").await);
    // The losing call must not have re-run the sequence.
    assert!(!forensic_path.exists());
}

// `initiate` runs from spawned tasks, so its future must stay Send; this
// fails to compile if a non-Send guard is ever held across an await inside
// the sequence.
#[test]
fn initiate_future_is_spawnable() {
    fn require_send<T: Send>(_: &T) {}

    let state = state_with_forensics("unused.json".into());
    let (_score_tx, score_rx) = watch::channel(0.0);
    let sequencer = ShutdownSequencer::new(state, score_rx, false);
    let future = sequencer.initiate("SEND_CHECK");
    require_send(&future);
    drop(future);
}

#[tokio::test]
async fn forensic_failure_does_not_block_shutdown() {
    let state = state_with_forensics("/proc/warden-cannot-write-here".into());
    let (_score_tx, score_rx) = watch::channel(0.0);
    let sequencer = ShutdownSequencer::new(Arc::clone(&state), score_rx, false);

    assert!(sequencer.initiate("CRITICAL_ANOMALY_THRESHOLD").await);
    assert!(!state.is_running());
    assert_eq!(state.containment.get(), ContainmentStatus::EmergencyShutdown);
}
