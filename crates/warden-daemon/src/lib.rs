//! Warden daemon orchestration.
//!
//! The [`Daemon`] ties the monitor loops, the score aggregator, the one-shot
//! firewall baseline, and signal handling into a single async process. All
//! loops share one [`MonitorState`] and push typed anomaly events into an
//! unbounded channel drained by the aggregator.

pub mod aggregator;
pub mod firewall;
pub mod loops;
pub mod report;
pub mod shutdown;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::info;

use warden_core::{AnomalyEvent, ContainmentCell, TripwireSet, WardenConfig};
use warden_sensor::BehaviorHistory;

use aggregator::ScoreAggregator;
use shutdown::ShutdownSequencer;

/// Retained incident records for forensics and reporting.
pub const INCIDENT_CAPACITY: usize = 100;

/// State shared by every monitor loop, the aggregator, and the shutdown
/// sequencer.
///
/// Tripwires and containment are lock-free; the remaining fields are mutated
/// rarely and guarded by async mutexes held only for short sections.
pub struct MonitorState {
    pub config: WardenConfig,
    pub running: AtomicBool,
    pub tripwires: TripwireSet,
    pub containment: ContainmentCell,
    pub history: Mutex<BehaviorHistory>,
    pub incidents: Mutex<VecDeque<AnomalyEvent>>,
    pub alignment: Mutex<f64>,
    /// Lifetime count of containment-boundary violations, for reporting.
    pub oracle_violations: AtomicU64,
}

impl MonitorState {
    pub fn new(config: WardenConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(true),
            tripwires: TripwireSet::new(),
            containment: ContainmentCell::new(),
            history: Mutex::new(BehaviorHistory::new()),
            incidents: Mutex::new(VecDeque::with_capacity(INCIDENT_CAPACITY)),
            // No observations yet is not evidence of misalignment.
            alignment: Mutex::new(1.0),
            oracle_violations: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Per-loop handle: shared state plus the event channel and the sequencer.
#[derive(Clone)]
pub struct MonitorContext {
    pub state: Arc<MonitorState>,
    pub events: mpsc::UnboundedSender<AnomalyEvent>,
    pub sequencer: Arc<ShutdownSequencer>,
}

/// The main daemon.
pub struct Daemon {
    config: WardenConfig,
}

impl Daemon {
    pub fn new(config: WardenConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Apply the firewall baseline, start every monitor loop, and run until
    /// a termination signal or an internal shutdown trigger.
    pub async fn run(self) -> Result<()> {
        let state = Arc::new(MonitorState::new(self.config));

        if state.config.firewall.enabled {
            firewall::apply_baseline(&state.config, &state.containment).await;
        } else {
            info!("firewall baseline disabled in configuration");
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (score_tx, score_rx) = watch::channel(0.0_f64);

        let sequencer = Arc::new(ShutdownSequencer::new(
            Arc::clone(&state),
            score_rx,
            true,
        ));
        let ctx = MonitorContext {
            state: Arc::clone(&state),
            events: events_tx,
            sequencer: Arc::clone(&sequencer),
        };

        // The aggregator keeps its score across supervisor restarts.
        let aggregator = Arc::new(Mutex::new(ScoreAggregator::new(
            events_rx,
            score_tx,
            &state.config,
        )));

        let tasks = vec![
            loops::supervise("proc-monitor", ctx.clone(), loops::process_loop),
            loops::supervise("log-monitor", ctx.clone(), loops::log_loop),
            loops::supervise("containment-verifier", ctx.clone(), loops::containment_loop),
            loops::supervise("alignment-monitor", ctx.clone(), loops::alignment_loop),
            loops::supervise("score-aggregator", ctx.clone(), move |ctx| {
                let aggregator = Arc::clone(&aggregator);
                async move { aggregator.lock().await.run(ctx).await }
            }),
        ];
        info!(loops = tasks.len(), "warden fully operational");

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
            let mut sigint =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
            tokio::select! {
                _ = sigterm.recv() => {
                    sequencer.initiate("SIGTERM").await;
                }
                _ = sigint.recv() => {
                    sequencer.initiate("SIGINT").await;
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            sequencer.initiate("CTRL_C").await;
        }

        // Reached only when another trigger already claimed the shutdown
        // latch; the sequencer exits the process on the winning path.
        state.stop();
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }
}
