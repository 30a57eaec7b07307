//! WS-Discovery probing and tolerant response scanning.
//!
//! Discovery is best-effort over an unreliable broadcast medium: one probe
//! datagram per subnet, then every datagram that arrives before the timeout
//! window closes is collected as-is. No responses is an expected outcome.
//!
//! Response scanning deliberately does not parse XML. Vendor discovery
//! replies vary in encoding and well-formedness, so a strict parser would
//! reject payloads a lenient token scan accepts; malformed input is in-scope
//! by design and simply contributes whatever address tokens it contains.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Result, ScanError};

/// WS-Discovery well-known UDP port.
pub const WS_DISCOVERY_PORT: u16 = 3702;

/// Receive buffer size; discovery replies fit comfortably in one datagram.
const MAX_DATAGRAM: usize = 4096;

static IPV4_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("IPv4 token pattern is valid")
});

/// One raw discovery reply, tagged with its sender.
pub type RawResponse = (SocketAddr, Vec<u8>);

/// Builds the WS-Discovery Probe envelope for `NetworkVideoTransmitter` targets.
fn probe_envelope(message_id: Uuid) -> String {
    format!(
        concat!(
            "<?xml version='1.0' encoding='UTF-8'?>",
            "<e:Envelope xmlns:e='http://www.w3.org/2003/05/soap-envelope' ",
            "xmlns:w='http://schemas.xmlsoap.org/ws/2004/08/addressing' ",
            "xmlns:d='http://schemas.xmlsoap.org/ws/2005/04/discovery' ",
            "xmlns:dn='http://www.onvif.org/ver10/network/wsdl'>",
            "<e:Header>",
            "<w:MessageID>uuid:{}</w:MessageID>",
            "<w:To>urn:schemas-xmlsoap-org:ws:2005:04/discovery</w:To>",
            "<w:Action>http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe</w:Action>",
            "</e:Header>",
            "<e:Body>",
            "<d:Probe>",
            "<d:Types>dn:NetworkVideoTransmitter</d:Types>",
            "</d:Probe>",
            "</e:Body>",
            "</e:Envelope>",
        ),
        message_id
    )
}

/// Broadcasts one WS-Discovery probe to `<subnet_prefix>.255:3702` and
/// collects raw replies until a receive attempt times out.
///
/// Every datagram received inside the window is returned regardless of
/// well-formedness. An empty result is not an error.
pub fn probe_subnet(subnet_prefix: &str, timeout: Duration) -> Result<Vec<RawResponse>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))
        .map_err(|e| ScanError::Discovery(format!("bind: {e}")))?;
    socket
        .set_broadcast(true)
        .map_err(|e| ScanError::Discovery(format!("SO_BROADCAST: {e}")))?;
    socket
        .set_read_timeout(Some(timeout))
        .map_err(|e| ScanError::Discovery(format!("read timeout: {e}")))?;

    let target = format!("{subnet_prefix}.255:{WS_DISCOVERY_PORT}");
    let envelope = probe_envelope(Uuid::new_v4());
    socket
        .send_to(envelope.as_bytes(), target.as_str())
        .map_err(|e| ScanError::Discovery(format!("send to {target}: {e}")))?;
    trace!(dest = %target, "Probe datagram sent");

    let mut responses = Vec::new();
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        match socket.recv_from(&mut buf) {
            Ok((len, sender)) => {
                trace!(sender = %sender, len, "Discovery reply received");
                responses.push((sender, buf[..len].to_vec()));
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) => return Err(ScanError::Discovery(format!("recv: {e}"))),
        }
    }

    debug!(
        subnet = subnet_prefix,
        replies = responses.len(),
        "Discovery window closed"
    );
    Ok(responses)
}

/// Tolerantly extracts unique dotted-quad tokens from raw discovery replies.
///
/// Each reply is scanned as lossy UTF-8 text together with its sender
/// address, so a device answering from its own IP is found even when its
/// payload is mangled. Result order is unspecified but deterministic
/// (first-seen order); duplicates across replies collapse to one entry.
#[must_use]
pub fn extract_ips(responses: &[RawResponse]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ips = Vec::new();
    for (sender, payload) in responses {
        let text = format!("{} {}", sender.ip(), String::from_utf8_lossy(payload));
        let mut matched = 0;
        for token in IPV4_TOKEN.find_iter(&text) {
            matched += 1;
            let token = token.as_str().to_string();
            if seen.insert(token.clone()) {
                ips.push(token);
            }
        }
        if matched == 0 {
            trace!(sender = %sender, "Reply carried no address tokens");
        }
    }
    ips
}
