//! Application settings and TOML configuration parsing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Top-level warden configuration, loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Root directory of the monitored framework. Scripts run by a trusted
    /// interpreter are allowed only if their resolved path lies under here.
    #[serde(default = "default_framework_dir")]
    pub framework_dir: PathBuf,

    /// Names of in-framework module processes. These are analyzed rather
    /// than flagged, and are the targets of the shutdown kill pass.
    #[serde(default)]
    pub watched_modules: Vec<String>,

    /// Essential system and user processes that are always allowed.
    #[serde(default = "default_essential_processes")]
    pub essential_processes: Vec<String>,

    /// Interpreters trusted to run whitelisted in-framework scripts.
    #[serde(default = "default_trusted_interpreters")]
    pub trusted_interpreters: Vec<String>,

    /// Kernel thread name prefixes that are always allowed.
    #[serde(default = "default_kernel_thread_prefixes")]
    pub kernel_thread_prefixes: Vec<String>,

    /// Command-line keywords that escalate an unauthorized process to the
    /// sensitive tier.
    #[serde(default = "default_sensitive_keywords")]
    pub sensitive_keywords: Vec<String>,

    /// Log files to tail for anomaly signatures.
    #[serde(default)]
    pub log_files: Vec<PathBuf>,

    /// Where the forensic snapshot is written on shutdown.
    #[serde(default = "default_forensic_path")]
    pub forensic_path: PathBuf,

    /// Score above which the degradation action fires.
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,

    /// Score above which emergency shutdown fires. Must exceed
    /// `anomaly_threshold`.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,

    /// Seconds to wait between SIGTERM and SIGKILL during the kill pass.
    #[serde(default = "default_kill_timeout")]
    pub kill_timeout_secs: u64,

    /// Monitor loop cadences.
    #[serde(default)]
    pub cadence: CadenceConfig,

    /// One-shot firewall baseline applied at startup.
    #[serde(default)]
    pub firewall: FirewallConfig,
}

/// Per-loop scheduling periods, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_process_secs")]
    pub process_secs: u64,
    #[serde(default = "default_log_secs")]
    pub log_secs: u64,
    #[serde(default = "default_containment_secs")]
    pub containment_secs: u64,
    #[serde(default = "default_alignment_secs")]
    pub alignment_secs: u64,
    #[serde(default = "default_aggregator_secs")]
    pub aggregator_secs: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            process_secs: default_process_secs(),
            log_secs: default_log_secs(),
            containment_secs: default_containment_secs(),
            alignment_secs: default_alignment_secs(),
            aggregator_secs: default_aggregator_secs(),
        }
    }
}

/// Static packet-filter baseline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallConfig {
    /// Whether to apply the iptables baseline at startup.
    #[serde(default)]
    pub enabled: bool,
    /// Inbound TCP ports accepted under the default-deny policy.
    #[serde(default = "default_allowed_ports")]
    pub allowed_inbound_ports: Vec<u16>,
    /// Hostnames or addresses allowed as outbound destinations.
    #[serde(default)]
    pub allowed_outbound: Vec<String>,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_inbound_ports: default_allowed_ports(),
            allowed_outbound: Vec::new(),
        }
    }
}

impl Default for WardenConfig {
    fn default() -> Self {
        // Round-trips through the empty document so the serde defaults are
        // the single source of truth.
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl WardenConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file: {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config file: {}", path.display()))?
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Enforce cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.critical_threshold <= self.anomaly_threshold {
            bail!(
                "critical_threshold ({}) must exceed anomaly_threshold ({})",
                self.critical_threshold,
                self.anomaly_threshold
            );
        }
        for port in &self.firewall.allowed_inbound_ports {
            if *port == 0 {
                bail!("allowed_inbound_ports must not contain 0");
            }
        }
        // A zero period would panic the interval timer of the owning loop.
        let cadences = [
            ("process_secs", self.cadence.process_secs),
            ("log_secs", self.cadence.log_secs),
            ("containment_secs", self.cadence.containment_secs),
            ("alignment_secs", self.cadence.alignment_secs),
            ("aggregator_secs", self.cadence.aggregator_secs),
        ];
        for (name, secs) in cadences {
            if secs == 0 {
                bail!("cadence.{name} must be at least 1 second");
            }
        }
        Ok(())
    }
}

fn default_framework_dir() -> PathBuf {
    PathBuf::from("/opt/warden/framework")
}

fn default_essential_processes() -> Vec<String> {
    [
        "sshd",
        "systemd",
        "bash",
        "cron",
        "init",
        "udevd",
        "dbus-daemon",
        "rpcbind",
        "acpid",
        "haveged",
        "wpa_supplicant",
        "getty",
        "su",
        "pipewire",
        "wireplumber",
        "Xorg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_trusted_interpreters() -> Vec<String> {
    vec!["python".to_string(), "python3".to_string()]
}

fn default_kernel_thread_prefixes() -> Vec<String> {
    [
        "kthreadd",
        "ksoftirqd/",
        "kworker/",
        "migration/",
        "rcu_",
        "kdevtmpfs",
        "netns",
        "mm_percpu_wq",
        "cpuhp/",
        "watchdog/",
        "kswapd",
        "ksmd",
        "khugepaged",
        "kintegrityd",
        "kblockd",
        "scsi_eh_",
        "scsi_tmf_",
        "nvme-",
        "irq/",
        "jbd2/",
        "ext4-",
        "dm_",
        "ipv6_addrconf",
        "cryptd",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sensitive_keywords() -> Vec<String> {
    [
        "cortex",
        "quantum",
        "consciousness",
        "selfmod",
        "recursive",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_forensic_path() -> PathBuf {
    PathBuf::from("warden_forensics.json")
}

fn default_anomaly_threshold() -> f64 {
    10.0
}

fn default_critical_threshold() -> f64 {
    50.0
}

fn default_kill_timeout() -> u64 {
    5
}

fn default_allowed_ports() -> Vec<u16> {
    vec![8080]
}

fn default_process_secs() -> u64 {
    2
}

fn default_log_secs() -> u64 {
    5
}

fn default_containment_secs() -> u64 {
    10
}

fn default_alignment_secs() -> u64 {
    30
}

fn default_aggregator_secs() -> u64 {
    60
}
