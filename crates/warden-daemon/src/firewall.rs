//! One-shot packet-filter baseline.
//!
//! Applied once at startup: flush, default-deny on all chains, loopback
//! accepts, the configured inbound ports and resolved outbound destinations,
//! and catch-all logging of drops. Any rule failure downgrades containment
//! to COMPROMISED but never aborts startup.

use std::net::IpAddr;

use tokio::process::Command;
use tracing::{error, info};

use warden_core::{ContainmentCell, ContainmentStatus, WardenConfig};

pub async fn apply_baseline(config: &WardenConfig, containment: &ContainmentCell) {
    let mut failed = false;

    let base: &[&[&str]] = &[
        &["-F"],
        &["-X"],
        &["-P", "INPUT", "DROP"],
        &["-P", "OUTPUT", "DROP"],
        &["-P", "FORWARD", "DROP"],
        &["-A", "INPUT", "-i", "lo", "-j", "ACCEPT"],
        &["-A", "OUTPUT", "-o", "lo", "-j", "ACCEPT"],
    ];
    for rule in base {
        failed |= !apply_rule(rule).await;
    }

    for port in &config.firewall.allowed_inbound_ports {
        let port = port.to_string();
        failed |= !apply_rule(&["-A", "INPUT", "-p", "tcp", "--dport", &port, "-j", "ACCEPT"]).await;
    }

    for dest in &config.firewall.allowed_outbound {
        match resolve(dest).await {
            Some(ip) => {
                let ip = ip.to_string();
                failed |= !apply_rule(&["-A", "OUTPUT", "-d", &ip, "-j", "ACCEPT"]).await;
            }
            None => {
                error!(destination = %dest, "DNS lookup failed for outbound destination");
                failed = true;
            }
        }
    }

    failed |= !apply_rule(&["-A", "INPUT", "-j", "LOG", "--log-prefix", "WARDEN-DROP-IN: "]).await;
    failed |= !apply_rule(&["-A", "OUTPUT", "-j", "LOG", "--log-prefix", "WARDEN-DROP-OUT: "]).await;

    if failed {
        error!("firewall baseline incomplete");
        containment.downgrade(ContainmentStatus::Compromised);
    } else {
        info!("firewall baseline applied");
    }
}

async fn apply_rule(args: &[&str]) -> bool {
    match Command::new("iptables").args(args).status().await {
        Ok(status) if status.success() => true,
        Ok(status) => {
            error!(rule = %args.join(" "), status = %status, "iptables rule rejected");
            false
        }
        Err(err) => {
            error!(rule = %args.join(" "), error = %err, "failed to run iptables");
            false
        }
    }
}

async fn resolve(dest: &str) -> Option<IpAddr> {
    tokio::net::lookup_host((dest, 0u16))
        .await
        .ok()?
        .next()
        .map(|addr| addr.ip())
}
