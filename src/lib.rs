//! ONVIF network camera scanner library.
//!
//! This library exposes the scanning pipeline of the `onvifscan` CLI for use
//! in tests and potentially other applications.
//!
//! # Modules
//!
//! - `interfaces`: local IPv4 address enumeration
//! - `discovery`: WS-Discovery probing and tolerant response scanning
//! - `onvif`: blocking SOAP client for the ONVIF device/media services
//! - `resolver`: RTSP stream-URI resolution and normalization
//! - `reachability`: stream-open oracle and reachability checking
//! - `inventory`: device records, reconciliation policies, persistence
//! - `scan`: pipeline orchestration
#![forbid(unsafe_code)]

pub mod cli;
pub mod discovery;
pub mod error;
pub mod interfaces;
pub mod inventory;
pub mod logging;
pub mod onvif;
pub mod reachability;
pub mod resolver;
pub mod scan;
