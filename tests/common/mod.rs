//! Shared fixtures for integration tests.
#![allow(dead_code)]

use onvifscan::inventory::{Access, DeviceRecord, ERROR_MARKER};

/// A healthy record with an openable stream.
pub fn open_record(ip: &str) -> DeviceRecord {
    DeviceRecord {
        ip: ip.to_string(),
        rtsp_link: format!("rtsp://{ip}:554/Streaming/Channels/101"),
        access: Access::Open,
        rtsp: Some("554/Streaming/Channels/101".to_string()),
    }
}

/// A record whose stream resolved but could not be opened.
pub fn closed_record(ip: &str) -> DeviceRecord {
    DeviceRecord {
        access: Access::Close,
        ..open_record(ip)
    }
}

/// A record for a device that failed resolution.
pub fn error_record(ip: &str) -> DeviceRecord {
    DeviceRecord {
        ip: ip.to_string(),
        rtsp_link: format!("{ERROR_MARKER}HTTP error 401 Unauthorized"),
        access: Access::Error,
        rtsp: None,
    }
}

/// IPs of records, in order, for compact order assertions.
pub fn ips(records: &[DeviceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.ip.as_str()).collect()
}
