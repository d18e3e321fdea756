//! Process snapshot source.
//!
//! Wraps `sysinfo` behind a snapshot API that tolerates processes vanishing
//! mid-scan and fields being absent: a bad entry is skipped, never fatal to
//! the scan. The `System` handle is kept across refreshes so CPU percentages
//! are computed from deltas.

use sysinfo::{ProcessesToUpdate, System};

/// One process as observed at snapshot time.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cmdline: Vec<String>,
    pub cpu_percent: f32,
    pub memory_rss: u64,
}

impl ProcessRecord {
    /// The command line joined for keyword scanning, lowercased.
    pub fn cmdline_lower(&self) -> String {
        self.cmdline.join(" ").to_lowercase()
    }
}

/// Host-wide resource utilization, for the safety check.
#[derive(Debug, Clone, Copy)]
pub struct HostUtilization {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Stateful process enumerator.
pub struct ProcessScanner {
    sys: System,
}

impl ProcessScanner {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    /// Refresh and return the current process set.
    pub fn snapshot(&mut self) -> Vec<ProcessRecord> {
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let mut records = Vec::with_capacity(self.sys.processes().len());
        for (raw_pid, process) in self.sys.processes() {
            let name = process.name().to_string_lossy().into_owned();
            if name.is_empty() {
                continue;
            }
            records.push(ProcessRecord {
                pid: raw_pid.as_u32(),
                name,
                cmdline: process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect(),
                cpu_percent: process.cpu_usage(),
                memory_rss: process.memory(),
            });
        }
        records
    }

    /// Host-wide CPU and memory pressure.
    pub fn host_utilization(&mut self) -> HostUtilization {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        let memory_percent = if total > 0 {
            (self.sys.used_memory() as f32 / total as f32) * 100.0
        } else {
            0.0
        };
        HostUtilization {
            cpu_percent: self.sys.global_cpu_usage(),
            memory_percent,
        }
    }
}

impl Default for ProcessScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_returns_live_processes() {
        let mut scanner = ProcessScanner::new();
        let records = scanner.snapshot();
        assert!(!records.is_empty());
        // The current test process must be present.
        assert!(records.iter().any(|r| r.pid == std::process::id()));
    }

    #[test]
    fn host_utilization_is_in_range() {
        let mut scanner = ProcessScanner::new();
        let util = scanner.host_utilization();
        assert!(util.memory_percent >= 0.0 && util.memory_percent <= 100.0);
        assert!(util.cpu_percent >= 0.0);
    }

    #[test]
    fn cmdline_lower_joins_and_lowercases() {
        let record = ProcessRecord {
            pid: 1,
            name: "python3".to_string(),
            cmdline: vec!["python3".to_string(), "Train.PY".to_string()],
            cpu_percent: 0.0,
            memory_rss: 0,
        };
        assert_eq!(record.cmdline_lower(), "python3 train.py");
    }
}
