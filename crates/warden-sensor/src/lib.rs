//! # warden-sensor
//!
//! Observation and detection for warden.
//!
//! This crate owns everything between the operating system and the anomaly
//! event channel: process snapshots, bounded log tailing, learned resource
//! baselines, per-process behavior windows, and the heuristic detector
//! family. Detectors are approximate by design; they report typed
//! [`warden_core::AnomalyEvent`]s and never fail an entire scan because one
//! process vanished mid-read.

pub mod baseline;
pub mod detectors;
pub mod flagged;
pub mod logtail;
pub mod procscan;

pub use baseline::{BaselineTracker, BehaviorHistory};
pub use detectors::Detection;
pub use flagged::RecentlyFlaggedSet;
pub use logtail::LogTailer;
pub use procscan::{HostUtilization, ProcessRecord, ProcessScanner};
