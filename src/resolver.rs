//! RTSP stream-URI resolution and normalization.
//!
//! [`resolve`] is the isolation point that keeps one bad device from
//! aborting a batch run: every failure in the ONVIF call chain is converted
//! into an error-sentinel string, never propagated.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};
use crate::inventory::ERROR_MARKER;
use crate::onvif::OnvifClient;

static RTSP_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rtsp://[^:/]+:(\d+)").expect("rtsp port pattern is valid"));

/// Resolve a device's RTSP stream URI and its normalized fragment.
///
/// Authenticates against the device's ONVIF service, takes the first media
/// profile, and requests an RTP-Unicast/RTSP stream URI for it. On success
/// returns `(uri, Some("<port>/<path>"))`; on any failure returns
/// `("Error: <description>", None)`.
pub fn resolve(
    ip: &str,
    port: u16,
    username: &str,
    password: &str,
    timeout: Duration,
) -> (String, Option<String>) {
    match try_resolve(ip, port, username, password, timeout) {
        Ok(uri) => {
            let fragment = stream_fragment(&uri, port);
            debug!(ip, uri = %uri, fragment = %fragment, "Stream URI resolved");
            (uri, Some(fragment))
        }
        Err(e) => {
            warn!(ip, error = %e, "Stream resolution failed");
            (format!("{ERROR_MARKER}{e}"), None)
        }
    }
}

fn try_resolve(
    ip: &str,
    port: u16,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<String> {
    let client = OnvifClient::new(ip, port, username, password, timeout)?;
    let media_xaddr = client.media_xaddr()?;
    let tokens = client.profile_tokens(&media_xaddr)?;
    // Only the first profile is considered
    let first = tokens.first().ok_or(ScanError::NoProfiles)?;
    client.stream_uri(&media_xaddr, first)
}

/// Builds the `"<port>/<path>"` fragment for a stream URI.
///
/// The port is taken from the URI when it carries one; otherwise
/// `fallback_port` is used, which is the ONVIF connection port and not
/// necessarily the RTSP port. That approximation is long-standing behavior
/// and kept as-is. The path is everything after the third `/`; a URI with a
/// shorter path yields an empty path part.
#[must_use]
pub fn stream_fragment(uri: &str, fallback_port: u16) -> String {
    let port = RTSP_PORT
        .captures(uri)
        .and_then(|c| c.get(1))
        .map_or_else(|| fallback_port.to_string(), |m| m.as_str().to_string());
    let path = uri.splitn(4, '/').nth(3).unwrap_or("");
    format!("{port}/{path}")
}
