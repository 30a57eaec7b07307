//! Error types for scanner operations.

use thiserror::Error;

/// Primary error type for scanner operations.
#[derive(Error, Debug)]
pub enum ScanError {
    // Run-level errors (abort the whole run)
    #[error("Failed to enumerate local interfaces: {0}")]
    InterfaceEnumeration(String),

    #[error("Discovery socket failure: {0}")]
    Discovery(String),

    // Per-device errors (absorbed into the device record)
    #[error("ONVIF request to {endpoint} failed: {reason}")]
    OnvifRequest { endpoint: String, reason: String },

    #[error("Device reported no media service address")]
    NoMediaService,

    #[error("Device reported no media profiles")]
    NoProfiles,

    #[error("Device reported no stream URI")]
    NoStreamUri,

    #[error("Stream probe failed: {0}")]
    StreamProbe(String),

    // General errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InterfaceEnumeration(_) => {
                Some("Ensure the `ip` tool (iproute2) is installed and on PATH")
            }
            Self::OnvifRequest { .. } => Some("Check the device's ONVIF port and credentials"),
            Self::Discovery(_) => Some("Discovery needs a UDP socket with broadcast permission"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| ScanError::Other(format!("{}: {e}", f().into())))
    }
}
