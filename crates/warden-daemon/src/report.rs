//! Periodic security report, emitted by the aggregator once per cadence.

use std::sync::atomic::Ordering;

use tracing::info;

use warden_sensor::HostUtilization;

use crate::MonitorState;

/// Log the structured security report.
pub async fn log_status(state: &MonitorState, score: f64, host: HostUtilization) {
    let alignment = *state.alignment.lock().await;
    let incidents = state.incidents.lock().await.len();
    let monitored = state.history.lock().await.identities().len();
    info!(
        score,
        containment = state.containment.get().as_str(),
        active_tripwires = ?state.tripwires.active(),
        alignment,
        incidents,
        monitored_modules = monitored,
        oracle_violations = state.oracle_violations.load(Ordering::Relaxed),
        host_cpu = host.cpu_percent,
        host_memory = host.memory_percent,
        "warden security report"
    );
}
