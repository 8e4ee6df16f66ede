//! Short, failure-tolerant probes used by `check auth`.
//!
//! A probe that cannot run (tool missing, timeout, non-zero exit) reports
//! `false`; it is never an error.

use std::time::Duration;

use tracing::debug;

use crate::executor::{CommandExecutor, ProcessInvocation};

const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// `true` if NetworkManager lists an activated VPN connection.
pub async fn vpn_active(executor: &CommandExecutor) -> bool {
    let outcome = executor
        .run(
            ProcessInvocation::new("nmcli")
                .args(["-t", "-f", "NAME,TYPE,STATE", "con", "show", "--active"])
                .timeout(PROBE_TIMEOUT),
        )
        .await;
    let active = outcome.success() && lists_active_vpn(&outcome.stdout_text());
    debug!(active, exit_code = outcome.exit_code(), "vpn probe finished");
    active
}

/// `true` if the credential cache holds a valid Kerberos ticket.
pub async fn kerberos_ticket(executor: &CommandExecutor) -> bool {
    let outcome = executor
        .run(
            ProcessInvocation::new("klist")
                .arg("-s")
                .timeout(PROBE_TIMEOUT),
        )
        .await;
    debug!(valid = outcome.success(), "kerberos probe finished");
    outcome.success()
}

/// Terse `nmcli` output has one `NAME:TYPE:STATE` line per connection.
fn lists_active_vpn(listing: &str) -> bool {
    listing
        .lines()
        .any(|line| line.contains(":vpn:") && line.contains(":activated"))
}
