//! Device inventory model, reconciliation policies, and JSON persistence.
//!
//! The inventory is an ordered collection of [`DeviceRecord`] keyed by IP.
//! Two reconciliation policies exist on purpose and are not unified:
//!
//! - [`Inventory::reconcile_full`] implements "last full scan wins": the
//!   inventory afterwards contains exactly the devices seen this run, and
//!   anything else is pruned.
//! - [`Inventory::reconcile_one`] upserts a single record and leaves every
//!   other entry untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ResultExt};

/// Prefix of the sentinel `rtsp_link` value produced when resolution fails.
pub const ERROR_MARKER: &str = "Error: ";

/// Whether a device's resolved stream could be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// The stream URI was resolved and could be opened.
    Open,
    /// The stream URI was resolved but could not be opened.
    Close,
    /// Resolution itself failed; `rtsp_link` holds an error sentinel.
    Error,
}

/// One discovered device, as persisted and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Dotted-quad IPv4 address; unique within an inventory snapshot.
    pub ip: String,
    /// Resolved `rtsp://…` URI, or an error sentinel starting with [`ERROR_MARKER`].
    pub rtsp_link: String,
    /// Reachability outcome for the resolved stream.
    pub access: Access,
    /// `"<port>/<path>"` fragment of the stream URI; `None` iff `access` is `Error`.
    pub rtsp: Option<String>,
}

impl DeviceRecord {
    /// True when `rtsp_link` is an error sentinel rather than a URI.
    pub fn is_error(&self) -> bool {
        self.rtsp_link.starts_with(ERROR_MARKER)
    }
}

/// Ordered, IP-keyed collection of device records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    records: Vec<DeviceRecord>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from records, preserving their order.
    #[must_use]
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        Self { records }
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by IP.
    #[must_use]
    pub fn get(&self, ip: &str) -> Option<&DeviceRecord> {
        self.records.iter().find(|r| r.ip == ip)
    }

    /// Load persisted state from `path`.
    ///
    /// A missing or unparseable file yields an empty inventory; persistence
    /// corruption is never fatal.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No inventory file, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Inventory file unreadable, starting empty");
                return Self::new();
            }
        };
        match serde_json::from_str::<Vec<DeviceRecord>>(&text) {
            Ok(records) => {
                debug!(path = %path.display(), count = records.len(), "Loaded inventory");
                Self { records }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Inventory file unparseable, starting empty");
                Self::new()
            }
        }
    }

    /// Write the inventory to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        let text = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write inventory {}", path.display()))?;
        debug!(path = %path.display(), count = self.records.len(), "Saved inventory");
        Ok(())
    }

    /// Bulk-scan reconciliation: last full scan wins.
    ///
    /// Afterwards the inventory holds exactly one record per IP in `scanned`.
    /// IPs already persisted keep their position but take the scanned record;
    /// IPs new this run are appended in scanned order; persisted IPs absent
    /// from `scanned` are dropped.
    pub fn reconcile_full(&mut self, scanned: Vec<DeviceRecord>) {
        let mut incoming: Vec<Option<DeviceRecord>> = scanned.into_iter().map(Some).collect();
        let mut merged = Vec::with_capacity(incoming.len());
        for old in self.records.drain(..) {
            let slot = incoming
                .iter_mut()
                .find(|s| s.as_ref().is_some_and(|r| r.ip == old.ip));
            if let Some(slot) = slot {
                if let Some(rec) = slot.take() {
                    merged.push(rec);
                }
            }
        }
        merged.extend(incoming.into_iter().flatten());
        self.records = merged;
    }

    /// Single-device reconciliation: replace in place or append.
    ///
    /// All other entries are retained unchanged; running this twice with the
    /// same record is equivalent to running it once.
    pub fn reconcile_one(&mut self, record: DeviceRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.ip == record.ip) {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }
}
