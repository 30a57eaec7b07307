//! Scan pipeline orchestration.
//!
//! Wires the stages together: interface enumeration, per-subnet discovery,
//! per-device resolution, and reachability checking. The pipeline is fully
//! sequential; total run time is the sum of the per-device timeouts.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::discovery;
use crate::error::Result;
use crate::interfaces::InterfaceSource;
use crate::inventory::{Access, DeviceRecord};
use crate::reachability::{self, StreamOpener};
use crate::resolver;

/// Credentials and timing for a scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// ONVIF username for every device.
    pub username: String,
    /// ONVIF password for every device.
    pub password: String,
    /// ONVIF service port for every device.
    pub port: u16,
    /// Receive window per subnet probe.
    pub discovery_timeout: Duration,
    /// Per-request timeout for ONVIF calls.
    pub onvif_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
            port: 80,
            discovery_timeout: Duration::from_secs(5),
            onvif_timeout: Duration::from_secs(5),
        }
    }
}

/// Probes every local subnet and produces one record per discovered device.
///
/// Devices are deduplicated run-wide, so an IP seen from two subnets is
/// resolved once. Per-device failures are encoded into records; the run only
/// aborts when interfaces cannot be enumerated or a probe socket cannot be
/// set up.
pub fn scan_all(
    interfaces: &dyn InterfaceSource,
    opener: &dyn StreamOpener,
    opts: &ScanOptions,
) -> Result<Vec<DeviceRecord>> {
    let local = interfaces.local_ipv4_addrs()?;
    info!(interfaces = local.len(), "Scanning local subnets");

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for addr in &local {
        let Some(prefix) = subnet_prefix(addr) else {
            warn!(addr = %addr, "Skipping address without a subnet prefix");
            continue;
        };
        let responses = discovery::probe_subnet(prefix, opts.discovery_timeout)?;
        if responses.is_empty() {
            debug!(subnet = prefix, "No discovery responses");
            continue;
        }
        for ip in new_ips(&responses, &mut seen) {
            records.push(probe_device(&ip, opener, opts));
        }
    }

    info!(devices = records.len(), "Scan complete");
    Ok(records)
}

/// Resolves and reachability-checks a single device.
pub fn probe_device(ip: &str, opener: &dyn StreamOpener, opts: &ScanOptions) -> DeviceRecord {
    let (rtsp_link, rtsp) = resolver::resolve(
        ip,
        opts.port,
        &opts.username,
        &opts.password,
        opts.onvif_timeout,
    );
    build_record(ip, rtsp_link, rtsp, opener)
}

/// Builds the record for a resolution outcome.
///
/// A sentinel link maps straight to `access = error`; the reachability
/// checker is never invoked for it.
pub fn build_record(
    ip: &str,
    rtsp_link: String,
    rtsp: Option<String>,
    opener: &dyn StreamOpener,
) -> DeviceRecord {
    let access = if rtsp_link.starts_with(crate::inventory::ERROR_MARKER) {
        Access::Error
    } else if reachability::is_reachable(opener, &rtsp_link) {
        Access::Open
    } else {
        Access::Close
    };
    debug!(ip, access = ?access, "Device probed");
    DeviceRecord {
        ip: ip.to_string(),
        rtsp_link,
        access,
        rtsp,
    }
}

/// `"a.b.c"` prefix of a dotted-quad address, used to form the broadcast target.
fn subnet_prefix(addr: &str) -> Option<&str> {
    addr.rsplit_once('.').map(|(prefix, _)| prefix)
}

/// IPs extracted from `responses` that `seen` has not recorded yet.
///
/// `seen` spans the whole run, so a device answering on two subnets is
/// resolved once.
fn new_ips(responses: &[discovery::RawResponse], seen: &mut HashSet<String>) -> Vec<String> {
    discovery::extract_ips(responses)
        .into_iter()
        .filter(|ip| seen.insert(ip.clone()))
        .collect()
}
