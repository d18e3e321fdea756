//! Process classification.
//!
//! A process is *allowed* if it matches the kernel-thread prefix whitelist,
//! the essential-process list, the declared watched-module list, or is a
//! trusted interpreter running a script whose resolved path lies under the
//! framework directory and is readable. Anything else is *suspicious*.

use std::path::{Path, PathBuf};

use warden_core::{AnomalyEvent, AnomalyKind, WardenConfig};

use crate::procscan::ProcessRecord;

use super::Detection;

/// Outcome of classifying one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Explicitly trusted; ignore.
    Allowed,
    /// A declared in-framework module; analyze rather than flag.
    WatchedModule,
    /// Matched no allow rule.
    Suspicious {
        /// Command line contains sensitive keywords.
        sensitive: bool,
    },
}

/// Static allow rules derived from configuration.
pub struct ProcessClassifier {
    kernel_thread_prefixes: Vec<String>,
    essential_processes: Vec<String>,
    watched_modules: Vec<String>,
    trusted_interpreters: Vec<String>,
    sensitive_keywords: Vec<String>,
    framework_dir: PathBuf,
}

impl ProcessClassifier {
    pub fn from_config(config: &WardenConfig) -> Self {
        Self {
            kernel_thread_prefixes: config.kernel_thread_prefixes.clone(),
            essential_processes: config.essential_processes.clone(),
            watched_modules: config.watched_modules.clone(),
            trusted_interpreters: config.trusted_interpreters.clone(),
            sensitive_keywords: config
                .sensitive_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            framework_dir: config.framework_dir.clone(),
        }
    }

    /// Classify a process record. Never errors: a record that cannot be
    /// resolved (e.g. its script vanished mid-check) is simply suspicious.
    pub fn classify(&self, record: &ProcessRecord) -> Classification {
        if self
            .kernel_thread_prefixes
            .iter()
            .any(|prefix| record.name.starts_with(prefix.as_str()))
        {
            return Classification::Allowed;
        }
        // Essential processes are allowed by name alone; an empty command
        // line must not disqualify them.
        if self.essential_processes.iter().any(|p| *p == record.name) {
            return Classification::Allowed;
        }
        if self.watched_modules.iter().any(|m| *m == record.name) {
            return Classification::WatchedModule;
        }
        if self.trusted_interpreters.iter().any(|i| *i == record.name)
            && self.runs_framework_script(record)
        {
            return Classification::Allowed;
        }

        let cmdline = record.cmdline_lower();
        let sensitive = self
            .sensitive_keywords
            .iter()
            .any(|keyword| cmdline.contains(keyword.as_str()));
        Classification::Suspicious { sensitive }
    }

    /// Events for an already-classified process: a suspicious verdict yields
    /// `unauthorized_process`, plus the higher-severity sensitive variant
    /// when keywords matched.
    pub fn report(&self, classification: Classification) -> Detection {
        let mut detection = Detection::none();
        if let Classification::Suspicious { sensitive } = classification {
            detection
                .events
                .push(AnomalyEvent::new(AnomalyKind::UnauthorizedProcess, "classifier"));
            if sensitive {
                detection.events.push(AnomalyEvent::new(
                    AnomalyKind::UnauthorizedSensitiveProcess,
                    "classifier",
                ));
            }
        }
        detection
    }

    fn runs_framework_script(&self, record: &ProcessRecord) -> bool {
        let Some(script) = record.cmdline.get(1) else {
            return false;
        };
        let Ok(script_path) = Path::new(script).canonicalize() else {
            return false;
        };
        let framework = self
            .framework_dir
            .canonicalize()
            .unwrap_or_else(|_| self.framework_dir.clone());
        if !script_path.starts_with(&framework) {
            return false;
        }
        script_is_readable(&script_path)
    }
}

fn script_is_readable(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}
