//! Risk score aggregation.
//!
//! The aggregator is the single owner of the [`RiskScore`]. Once per cadence
//! it drains the event channel, folds the summed severities into the score,
//! applies wall-time decay, and escalates: the anomaly threshold degrades
//! capabilities, the critical threshold hands off to the shutdown sequencer.
//! Reporting reads the score through a watch channel snapshot, never the
//! live value.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::error;

use warden_core::{AnomalyEvent, RiskScore, ScoreVerdict, WardenConfig};
use warden_sensor::ProcessScanner;

use crate::{report, MonitorContext, MonitorState, INCIDENT_CAPACITY};

pub struct ScoreAggregator {
    events_rx: mpsc::UnboundedReceiver<AnomalyEvent>,
    score_tx: watch::Sender<f64>,
    score: RiskScore,
}

impl ScoreAggregator {
    pub fn new(
        events_rx: mpsc::UnboundedReceiver<AnomalyEvent>,
        score_tx: watch::Sender<f64>,
        config: &WardenConfig,
    ) -> Self {
        Self {
            events_rx,
            score_tx,
            score: RiskScore::new(config.anomaly_threshold, config.critical_threshold),
        }
    }

    /// One aggregation cycle: drain, add, decay, publish.
    ///
    /// Returns the verdict computed after decay. A `Degrade` verdict applies
    /// the degradation action here; a `Shutdown` verdict is the caller's to
    /// act on, so the published snapshot still carries the critical score.
    pub async fn cycle(&mut self, state: &MonitorState, elapsed_minutes: f64) -> ScoreVerdict {
        let mut severity_sum = 0u32;
        {
            let mut incidents = state.incidents.lock().await;
            while let Ok(event) = self.events_rx.try_recv() {
                severity_sum += event.severity;
                if incidents.len() == INCIDENT_CAPACITY {
                    incidents.pop_front();
                }
                incidents.push_back(event);
            }
        }

        self.score.add(severity_sum);
        self.score.decay(elapsed_minutes);

        let verdict = self.score.verdict();
        if verdict == ScoreVerdict::Degrade {
            error!(
                score = self.score.value(),
                "ANOMALY THRESHOLD EXCEEDED, degrading capabilities"
            );
            self.score.degrade();
        }
        let _ = self.score_tx.send(self.score.value());
        verdict
    }

    pub async fn run(&mut self, ctx: MonitorContext) {
        let cadence = Duration::from_secs(ctx.state.config.cadence.aggregator_secs);
        let mut ticker = interval(cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut scanner = ProcessScanner::new();
        let mut last_cycle = Instant::now();

        while ctx.state.is_running() {
            ticker.tick().await;
            let elapsed_minutes = last_cycle.elapsed().as_secs_f64() / 60.0;
            last_cycle = Instant::now();

            let verdict = self.cycle(&ctx.state, elapsed_minutes).await;
            report::log_status(&ctx.state, self.score.value(), scanner.host_utilization()).await;

            if verdict == ScoreVerdict::Shutdown {
                ctx.sequencer.initiate("CRITICAL_ANOMALY_THRESHOLD").await;
            }
        }
    }
}
