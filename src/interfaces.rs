//! Local network interface enumeration.
//!
//! The scanner only needs a list of local IPv4 addresses to derive subnet
//! broadcast targets. That capability sits behind [`InterfaceSource`] so the
//! pipeline can be driven with a fixed list in tests.

use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Result, ScanError};

static INET_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"inet\s+(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("inet pattern is valid")
});

/// Supplier of local IPv4 addresses.
pub trait InterfaceSource {
    /// All local IPv4 addresses in dotted-quad form.
    ///
    /// # Errors
    ///
    /// Failure here is the one condition that aborts a batch run.
    fn local_ipv4_addrs(&self) -> Result<Vec<String>>;
}

/// Enumerates addresses by running `ip -4 addr`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn local_ipv4_addrs(&self) -> Result<Vec<String>> {
        let output = Command::new("ip")
            .args(["-4", "addr"])
            .output()
            .map_err(|e| ScanError::InterfaceEnumeration(e.to_string()))?;
        if !output.status.success() {
            return Err(ScanError::InterfaceEnumeration(format!(
                "`ip -4 addr` exited with {}",
                output.status
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let addrs = parse_inet_addrs(&text);
        debug!(count = addrs.len(), "Enumerated local IPv4 addresses");
        Ok(addrs)
    }
}

/// Fixed address list, for tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct StaticInterfaces {
    addrs: Vec<String>,
}

impl StaticInterfaces {
    /// Build a source returning exactly `addrs`.
    #[must_use]
    pub fn new<I, S>(addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addrs: addrs.into_iter().map(Into::into).collect(),
        }
    }
}

impl InterfaceSource for StaticInterfaces {
    fn local_ipv4_addrs(&self) -> Result<Vec<String>> {
        Ok(self.addrs.clone())
    }
}

/// Extracts `inet <dotted-quad>` addresses from `ip -4 addr` output.
#[must_use]
pub fn parse_inet_addrs(text: &str) -> Vec<String> {
    INET_ADDR
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
