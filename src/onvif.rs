//! Minimal blocking ONVIF SOAP client.
//!
//! Covers exactly the calls the resolver needs: GetCapabilities (to find the
//! media service address), GetProfiles, and GetStreamUri. Requests carry a
//! WS-Security UsernameToken header; responses are scanned tolerantly with
//! regexes rather than parsed against the ONVIF schemas, consistent with the
//! lenient handling of discovery replies.

use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use reqwest::blocking::Client;
use sha1::{Digest, Sha1};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Result, ScanError};

static MEDIA_XADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?Media>.*?<(?:\w+:)?XAddr>\s*([^<\s]+)")
        .expect("media xaddr pattern is valid")
});

static PROFILE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:\w+:)?Profiles[^>]*\btoken="([^"]+)""#).expect("profile pattern is valid")
});

static URI_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:\w+:)?Uri>\s*([^<\s]+)\s*</").expect("uri pattern is valid")
});

/// Blocking SOAP client for one device.
pub struct OnvifClient {
    device_xaddr: String,
    username: String,
    password: String,
    http: Client,
}

impl OnvifClient {
    /// Create a client for the device service at `http://<ip>:<port>/onvif/device_service`.
    pub fn new(
        ip: &str,
        port: u16,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let device_xaddr = format!("http://{ip}:{port}/onvif/device_service");
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::OnvifRequest {
                endpoint: device_xaddr.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            device_xaddr,
            username: username.to_string(),
            password: password.to_string(),
            http,
        })
    }

    /// Resolve the media service address via GetCapabilities.
    pub fn media_xaddr(&self) -> Result<String> {
        let body = r#"<tds:GetCapabilities xmlns:tds="http://www.onvif.org/ver10/device/wsdl"><tds:Category>Media</tds:Category></tds:GetCapabilities>"#;
        let response = self.post(&self.device_xaddr, body)?;
        extract_media_xaddr(&response).ok_or(ScanError::NoMediaService)
    }

    /// Profile tokens in device order.
    pub fn profile_tokens(&self, media_xaddr: &str) -> Result<Vec<String>> {
        let body = r#"<trt:GetProfiles xmlns:trt="http://www.onvif.org/ver10/media/wsdl"/>"#;
        let response = self.post(media_xaddr, body)?;
        let tokens = extract_profile_tokens(&response);
        debug!(endpoint = media_xaddr, profiles = tokens.len(), "Profiles retrieved");
        Ok(tokens)
    }

    /// Stream URI for one profile: RTP-Unicast over RTSP.
    pub fn stream_uri(&self, media_xaddr: &str, profile_token: &str) -> Result<String> {
        let body = format!(
            concat!(
                r#"<trt:GetStreamUri xmlns:trt="http://www.onvif.org/ver10/media/wsdl" "#,
                r#"xmlns:tt="http://www.onvif.org/ver10/schema">"#,
                "<trt:StreamSetup>",
                "<tt:Stream>RTP-Unicast</tt:Stream>",
                "<tt:Transport><tt:Protocol>RTSP</tt:Protocol></tt:Transport>",
                "</trt:StreamSetup>",
                "<trt:ProfileToken>{}</trt:ProfileToken>",
                "</trt:GetStreamUri>",
            ),
            profile_token
        );
        let response = self.post(media_xaddr, &body)?;
        extract_uri(&response).ok_or(ScanError::NoStreamUri)
    }

    /// Wraps `body` in an authenticated SOAP 1.2 envelope and POSTs it.
    fn post(&self, endpoint: &str, body: &str) -> Result<String> {
        let envelope = self.envelope(body);
        trace!(endpoint, "Sending SOAP request");
        let response = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/soap+xml; charset=utf-8")
            .body(envelope)
            .send()
            .map_err(|e| ScanError::OnvifRequest {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| ScanError::OnvifRequest {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(ScanError::OnvifRequest {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP {status}: {}", snippet(&text)),
            });
        }
        Ok(text)
    }

    fn envelope(&self, body: &str) -> String {
        format!(
            concat!(
                r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">"#,
                "{}",
                "<s:Body>{}</s:Body>",
                "</s:Envelope>",
            ),
            self.security_header(),
            body
        )
    }

    /// WS-Security UsernameToken header with a fresh nonce and timestamp.
    fn security_header(&self) -> String {
        let nonce = *Uuid::new_v4().as_bytes();
        let created = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let digest = password_digest(&nonce, &created, &self.password);
        format!(
            concat!(
                "<s:Header>",
                r#"<wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd" "#,
                r#"xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">"#,
                "<wsse:UsernameToken>",
                "<wsse:Username>{}</wsse:Username>",
                r#"<wsse:Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{}</wsse:Password>"#,
                r#"<wsse:Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{}</wsse:Nonce>"#,
                "<wsu:Created>{}</wsu:Created>",
                "</wsse:UsernameToken>",
                "</wsse:Security>",
                "</s:Header>",
            ),
            self.username,
            digest,
            BASE64.encode(nonce),
            created
        )
    }
}

/// `base64(sha1(nonce || created || password))`, per the UsernameToken profile.
fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

fn extract_media_xaddr(response: &str) -> Option<String> {
    MEDIA_XADDR
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_profile_tokens(response: &str) -> Vec<String> {
    PROFILE_TOKEN
        .captures_iter(response)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn extract_uri(response: &str) -> Option<String> {
    URI_TEXT
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Trims a response body for inclusion in error messages.
fn snippet(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map_or(text.len(), |(idx, _)| idx);
    text[..end].trim()
}
