//! Independently-paced monitor loops.
//!
//! Each loop owns its detectors, runs on its own cadence, and talks to the
//! rest of the daemon only through the shared [`MonitorContext`]: events go
//! into the channel, tripwires are set on the shared set, and a warranted
//! tripwire combination hands off to the shutdown sequencer. A loop observes
//! the stop flag at its next tick boundary; nothing interrupts an iteration
//! in flight.

use std::future::Future;
use std::sync::atomic::Ordering;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, warn};

use warden_core::{AnomalyEvent, AnomalyKind, ContainmentStatus, Tripwire};
use warden_sensor::detectors::entropy::EntropyPair;
use warden_sensor::detectors::{
    check_consistency, AlignmentScorer, CapabilityMonitor, Classification, ContainmentVerifier,
    LogPatternDetector, MemoryPatternDetector, ProcessClassifier,
};
use warden_sensor::{Detection, LogTailer, ProcessScanner, RecentlyFlaggedSet};

use crate::MonitorContext;

/// Wall time between host safety checks inside the process loop.
const SAFETY_CHECK_PERIOD: Duration = Duration::from_secs(30);

/// Host CPU or memory above this share counts as resource pressure.
const HOST_PRESSURE_PERCENT: f32 = 95.0;

/// Spawn a monitor loop under supervision.
///
/// A panicking iteration must never starve the other loops: the panic is
/// logged, counted as a generic monitoring anomaly, and the loop restarts.
pub fn supervise<F, Fut>(name: &'static str, ctx: MonitorContext, body: F) -> JoinHandle<()>
where
    F: Fn(MonitorContext) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let task = tokio::spawn(body(ctx.clone()));
            match task.await {
                Ok(()) => break,
                Err(err) if err.is_panic() => {
                    error!(monitor = name, "monitor loop panicked, restarting");
                    let _ = ctx
                        .events
                        .send(AnomalyEvent::new(AnomalyKind::MonitoringError, name));
                }
                Err(_) => break,
            }
            if !ctx.state.is_running() {
                break;
            }
        }
    })
}

/// Deliver a detection: activate tripwires, enqueue events, and escalate if
/// the tripwire combination now warrants shutdown.
async fn dispatch(ctx: &MonitorContext, detection: Detection) {
    for tripwire in &detection.tripwires {
        ctx.state.tripwires.set(*tripwire);
    }
    for event in detection.events {
        if ctx.events.send(event).is_err() {
            warn!("anomaly channel closed, dropping event");
        }
    }
    if ctx.state.tripwires.evaluate() {
        ctx.sequencer.initiate("TRIPWIRE_ACTIVATED").await;
    }
}

/// Process monitor: classification, watched-module analysis, and the
/// periodic host safety check.
pub async fn process_loop(ctx: MonitorContext) {
    let mut ticker = interval(Duration::from_secs(ctx.state.config.cadence.process_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let classifier = ProcessClassifier::from_config(&ctx.state.config);
    let mut scanner = ProcessScanner::new();
    let mut capability = CapabilityMonitor::new();
    let mut memory = MemoryPatternDetector::new();
    let mut flagged = RecentlyFlaggedSet::default();
    let mut last_safety_check = Instant::now();

    while ctx.state.is_running() {
        ticker.tick().await;
        let mut detection = Detection::none();

        for record in scanner.snapshot() {
            let classification = classifier.classify(&record);
            match classification {
                Classification::Allowed => {}
                Classification::WatchedModule => {
                    detection.merge(capability.evaluate(&record));
                    detection.merge(memory.evaluate(&record));
                    let mut history = ctx.state.history.lock().await;
                    history.push(&record.name, record.cpu_percent, record.memory_rss);
                    detection.merge(check_consistency(&history, &record.name));
                }
                Classification::Suspicious { .. } => {
                    if flagged.insert(record.pid) {
                        warn!(
                            pid = record.pid,
                            process = %record.name,
                            "unauthorized process detected"
                        );
                        detection.merge(classifier.report(classification));
                    }
                }
            }
        }

        if last_safety_check.elapsed() >= SAFETY_CHECK_PERIOD {
            last_safety_check = Instant::now();
            detection.merge(safety_check(&ctx, &mut scanner));
        }

        dispatch(&ctx, detection).await;
    }
}

/// The monitor's own integrity plus host resource pressure.
fn safety_check(ctx: &MonitorContext, scanner: &mut ProcessScanner) -> Detection {
    let mut detection = Detection::none();

    if ctx.state.containment.get() != ContainmentStatus::Active {
        error!("CONTAINMENT BREACH DETECTED");
        detection.tripwires.push(Tripwire::ContainmentBreach);
    }

    let host = scanner.host_utilization();
    if host.cpu_percent > HOST_PRESSURE_PERCENT || host.memory_percent > HOST_PRESSURE_PERCENT {
        warn!(
            cpu = host.cpu_percent,
            memory = host.memory_percent,
            "high host resource usage"
        );
        detection
            .events
            .push(AnomalyEvent::new(AnomalyKind::HighResourceUsage, "safety-check"));
    }
    detection
}

/// Log monitor: scans appended lines of the configured log files.
pub async fn log_loop(ctx: MonitorContext) {
    let mut ticker = interval(Duration::from_secs(ctx.state.config.cadence.log_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tailer = LogTailer::new(ctx.state.config.log_files.clone());
    let detector = LogPatternDetector::new();

    while ctx.state.is_running() {
        ticker.tick().await;
        let mut detection = Detection::none();
        for line in tailer.collect() {
            detection.merge(detector.evaluate_line(&line));
        }
        dispatch(&ctx, detection).await;
    }
}

/// Containment verifier: checks information-theoretic containment over
/// sampled entropy pairs.
pub async fn containment_loop(ctx: MonitorContext) {
    let mut ticker = interval(Duration::from_secs(ctx.state.config.cadence.containment_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut verifier = ContainmentVerifier::new();

    while ctx.state.is_running() {
        ticker.tick().await;
        // No instrumented data path yet; sample the boundary synthetically.
        let pair = {
            let mut rng = rand::thread_rng();
            EntropyPair {
                input: rng.gen_range(1.0..5.0),
                output: rng.gen_range(1.0..6.0),
            }
        };
        let detection = verifier.verify(pair);
        ctx.state
            .oracle_violations
            .store(verifier.violation_count(), Ordering::Relaxed);
        dispatch(&ctx, detection).await;
    }
}

/// Alignment monitor: scores action labels derived from the watched-module
/// behavior history.
pub async fn alignment_loop(ctx: MonitorContext) {
    let mut ticker = interval(Duration::from_secs(ctx.state.config.cadence.alignment_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut scorer = AlignmentScorer::new();

    while ctx.state.is_running() {
        ticker.tick().await;
        let actions: Vec<String> = {
            let history = ctx.state.history.lock().await;
            history
                .identities()
                .into_iter()
                .map(|name| format!("process_{name}_action"))
                .collect()
        };
        if actions.is_empty() {
            continue;
        }
        let detection = scorer.evaluate(&actions);
        *ctx.state.alignment.lock().await = scorer.rolling_mean();
        dispatch(&ctx, detection).await;
    }
}
