//! # warden-core
//!
//! Core type system for warden -- a runtime containment monitor for AI
//! workloads.
//!
//! This crate defines the shared types used across all warden components:
//! anomaly events and their severity table, the tripwire state machine, the
//! containment status, the decaying risk score, the forensic snapshot record,
//! and TOML configuration.

pub mod config;
pub mod containment;
pub mod event;
pub mod forensic;
pub mod score;
pub mod tripwire;

pub use config::settings::WardenConfig;
pub use containment::{ContainmentCell, ContainmentStatus};
pub use event::{AnomalyEvent, AnomalyKind};
pub use forensic::ForensicSnapshot;
pub use score::{RiskScore, ScoreVerdict};
pub use tripwire::{Tripwire, TripwireSet};
