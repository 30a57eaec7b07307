//! Stream reachability checking.
//!
//! The actual "can this URI be opened" capability sits behind the
//! [`StreamOpener`] trait. [`is_reachable`] wraps it with the guarantees the
//! pipeline relies on: it never propagates a failure, and it suppresses
//! stderr for the duration of the call so the capability's diagnostics
//! cannot interleave with the scanner's own output.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::time::Duration;

use gag::Gag;
use tracing::{debug, trace};

use crate::error::{Result, ScanError};

/// Default RTSP port when the URI carries none.
const RTSP_DEFAULT_PORT: u16 = 554;

/// External capability deciding whether a stream URI can be opened.
pub trait StreamOpener {
    /// Attempt to open the stream; `Ok(true)` means it is currently servable.
    fn try_open(&self, rtsp_link: &str) -> Result<bool>;
}

/// Lightweight RTSP probe: TCP connect plus one `OPTIONS` exchange.
///
/// Confirms the stream endpoint is currently servable without negotiating
/// playback.
#[derive(Debug, Clone, Copy)]
pub struct RtspProbe {
    timeout: Duration,
}

impl RtspProbe {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RtspProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl StreamOpener for RtspProbe {
    fn try_open(&self, rtsp_link: &str) -> Result<bool> {
        let (host, port) = rtsp_endpoint(rtsp_link)
            .ok_or_else(|| ScanError::StreamProbe(format!("not an rtsp URI: {rtsp_link}")))?;
        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| ScanError::StreamProbe(format!("{host}:{port}: {e}")))?
            .next()
            .ok_or_else(|| ScanError::StreamProbe(format!("{host}:{port}: no address")))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| ScanError::StreamProbe(format!("connect {addr}: {e}")))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        write!(stream, "OPTIONS {rtsp_link} RTSP/1.0\r\nCSeq: 1\r\n\r\n")?;
        // Servers may trickle the status line; keep reading until the
        // protocol prefix is decidable or the peer closes.
        const PREFIX: &[u8] = b"RTSP/";
        let mut buf = [0u8; 256];
        let mut filled = 0;
        while filled < PREFIX.len() {
            let n = stream.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(buf[..filled].starts_with(PREFIX))
    }
}

/// Host and port of an `rtsp://` URI, or `None` when it is not one.
fn rtsp_endpoint(rtsp_link: &str) -> Option<(String, u16)> {
    let rest = rtsp_link.strip_prefix("rtsp://")?;
    let authority = rest.split(['/', '?']).next()?;
    if authority.is_empty() {
        return None;
    }
    // credentials may be embedded ahead of the host
    let hostport = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    match hostport.rsplit_once(':') {
        Some((host, port)) => port.parse().ok().map(|p| (host.to_string(), p)),
        None => Some((hostport.to_string(), RTSP_DEFAULT_PORT)),
    }
}

/// True iff the opener reports the stream as opened.
///
/// Any failure from the opener is `false`, never propagated. Stderr is
/// redirected while the opener runs; the guard restores it on every exit
/// path, including early returns, when dropped.
pub fn is_reachable(opener: &dyn StreamOpener, rtsp_link: &str) -> bool {
    let result = {
        let _silence = Gag::stderr().ok();
        opener.try_open(rtsp_link)
    };
    match result {
        Ok(opened) => {
            trace!(uri = rtsp_link, opened, "Stream probe finished");
            opened
        }
        Err(e) => {
            debug!(uri = rtsp_link, error = %e, "Stream probe failed");
            false
        }
    }
}

/// Scriptable opener for tests: opens or fails per exact URI, and records
/// every call for assertions.
#[derive(Debug, Default)]
pub struct ScriptedOpener {
    opens: HashSet<String>,
    fails: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedOpener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `uri` as openable.
    #[must_use]
    pub fn opens(mut self, uri: &str) -> Self {
        self.opens.insert(uri.to_string());
        self
    }

    /// Make `uri` produce an opener error (not merely "closed").
    #[must_use]
    pub fn fails(mut self, uri: &str) -> Self {
        self.fails.insert(uri.to_string());
        self
    }

    /// URIs this opener has been asked about, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the call-log lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log lock poisoned").clone()
    }
}

impl StreamOpener for ScriptedOpener {
    fn try_open(&self, rtsp_link: &str) -> Result<bool> {
        self.calls
            .lock()
            .expect("call log lock poisoned")
            .push(rtsp_link.to_string());
        if self.fails.contains(rtsp_link) {
            return Err(ScanError::StreamProbe("scripted failure".to_string()));
        }
        Ok(self.opens.contains(rtsp_link))
    }
}
