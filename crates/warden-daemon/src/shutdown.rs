//! Emergency shutdown sequencer.
//!
//! At most one shutdown sequence runs per process lifetime; the tripwire
//! latch is claimed atomically before any side effect. The sequence
//! is: stop the loops, persist forensics, terminate watched modules with a
//! graceful-then-forced two-phase stop, downgrade containment, exit nonzero.
//! Forensic persistence failure is logged and never blocks the rest.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use warden_core::{ContainmentStatus, ForensicSnapshot, Tripwire};

use crate::MonitorState;

const KILL_POLL_PERIOD: Duration = Duration::from_millis(250);

pub struct ShutdownSequencer {
    state: Arc<MonitorState>,
    score_rx: watch::Receiver<f64>,
    /// Exit the process at the end of the sequence. Disabled in tests so the
    /// full sequence can run in-process.
    exit_process: bool,
}

impl ShutdownSequencer {
    pub fn new(state: Arc<MonitorState>, score_rx: watch::Receiver<f64>, exit_process: bool) -> Self {
        Self {
            state,
            score_rx,
            exit_process,
        }
    }

    /// Run the shutdown sequence. Returns false without side effects when
    /// another caller already claimed the latch.
    pub async fn initiate(&self, reason: &str) -> bool {
        if !self.state.tripwires.claim_shutdown() {
            return false;
        }
        error!(reason, "EMERGENCY SHUTDOWN INITIATED");
        self.state.running.store(false, Ordering::SeqCst);

        let snapshot = self.build_snapshot(reason).await;
        match snapshot.persist(&self.state.config.forensic_path) {
            Ok(()) => info!(
                path = %self.state.config.forensic_path.display(),
                "forensic snapshot saved"
            ),
            Err(err) => error!(error = %err, "failed to persist forensic snapshot"),
        }

        self.terminate_watched_modules().await;
        self.state
            .containment
            .downgrade(ContainmentStatus::EmergencyShutdown);
        error!(reason, "emergency shutdown complete");

        if self.exit_process {
            std::process::exit(1);
        }
        true
    }

    async fn build_snapshot(&self, reason: &str) -> ForensicSnapshot {
        let tripwire_states = Tripwire::ALL
            .iter()
            .map(|t| (t.name().to_string(), self.state.tripwires.is_set(*t)))
            .collect();
        // The watch guard is not Send; drop it before the locks below are
        // awaited so this future stays spawnable.
        let risk_score = *self.score_rx.borrow();
        ForensicSnapshot {
            timestamp: Utc::now(),
            shutdown_reason: reason.to_string(),
            risk_score,
            tripwire_states,
            behavioral_history: self.state.history.lock().await.export(),
            security_incidents: self.state.incidents.lock().await.iter().cloned().collect(),
            alignment_score: *self.state.alignment.lock().await,
            containment_status: ContainmentStatus::EmergencyShutdown,
        }
    }

    /// SIGTERM every process named in `watched_modules`, wait up to the
    /// configured timeout, then SIGKILL the survivors.
    async fn terminate_watched_modules(&self) {
        let targets = &self.state.config.watched_modules;
        if targets.is_empty() {
            return;
        }

        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let mut pending: Vec<Pid> = Vec::new();
        for (pid, process) in sys.processes() {
            let name = process.name().to_string_lossy();
            if targets.iter().any(|m| *m == name) {
                info!(pid = pid.as_u32(), process = %name, "terminating watched module");
                if process.kill_with(Signal::Term).is_none() {
                    // Platform without SIGTERM support; skip straight to kill.
                    process.kill();
                }
                pending.push(*pid);
            }
        }
        if pending.is_empty() {
            return;
        }

        let deadline = Instant::now() + Duration::from_secs(self.state.config.kill_timeout_secs);
        while Instant::now() < deadline {
            sleep(KILL_POLL_PERIOD).await;
            sys.refresh_processes(ProcessesToUpdate::Some(&pending), true);
            pending.retain(|pid| sys.process(*pid).is_some());
            if pending.is_empty() {
                return;
            }
        }

        for pid in &pending {
            if let Some(process) = sys.process(*pid) {
                warn!(pid = pid.as_u32(), "grace period expired, force killing");
                process.kill();
            }
        }
    }
}
