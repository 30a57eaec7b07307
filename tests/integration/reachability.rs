//! Integration tests for the RTSP probe against local TCP listeners.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use onvifscan::reachability::{RtspProbe, StreamOpener, is_reachable};

/// Spawns a one-shot TCP server that answers any request with `reply`.
fn one_shot_server(reply: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(reply);
        }
    });
    port
}

#[test]
fn test_rtsp_server_is_reachable() {
    let port = one_shot_server(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n");
    let probe = RtspProbe::new(Duration::from_secs(2));
    let uri = format!("rtsp://127.0.0.1:{port}/live/ch0");
    assert!(is_reachable(&probe, &uri));
}

#[test]
fn test_non_rtsp_server_is_not_reachable() {
    let port = one_shot_server(b"HTTP/1.1 404 Not Found\r\n\r\n");
    let probe = RtspProbe::new(Duration::from_secs(2));
    let uri = format!("rtsp://127.0.0.1:{port}/live/ch0");
    assert!(!is_reachable(&probe, &uri));
}

#[test]
fn test_rtsp_server_that_trickles_bytes_is_reachable() {
    // The status line arrives in fragments smaller than the "RTSP/" prefix;
    // the probe must keep reading instead of judging the first fragment.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 512];
            let _ = stream.read(&mut buf);
            for chunk in [b"RT".as_slice(), b"SP", b"/1.0 200 OK\r\nCSeq: 1\r\n\r\n"] {
                let _ = stream.write_all(chunk);
                let _ = stream.flush();
                thread::sleep(Duration::from_millis(30));
            }
        }
    });

    let probe = RtspProbe::default();
    let uri = format!("rtsp://127.0.0.1:{port}/live/ch0");
    assert!(is_reachable(&probe, &uri));
}

#[test]
fn test_probe_honors_configured_timeout() {
    // The server accepts but never answers; a 300ms probe must give up well
    // before the built-in default would.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(Duration::from_secs(4));
            drop(stream);
        }
    });

    let probe = RtspProbe::new(Duration::from_millis(300));
    let uri = format!("rtsp://127.0.0.1:{port}/live/ch0");
    let started = Instant::now();
    assert!(!is_reachable(&probe, &uri));
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "probe must be bounded by its configured timeout, not a fixed default"
    );
}

#[test]
fn test_closed_port_is_not_reachable() {
    // Bind then drop to get a port with nothing listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let probe = RtspProbe::new(Duration::from_millis(500));
    let uri = format!("rtsp://127.0.0.1:{port}/live/ch0");
    assert!(!is_reachable(&probe, &uri));
}

#[test]
fn test_malformed_uri_is_not_reachable() {
    let probe = RtspProbe::new(Duration::from_millis(500));
    assert!(!is_reachable(&probe, "not a uri"));
    assert!(!is_reachable(&probe, "rtsp://"));
    assert!(!is_reachable(&probe, "Error: HTTP error 401 Unauthorized"));
}

#[test]
fn test_try_open_reports_errors_that_is_reachable_absorbs() {
    let probe = RtspProbe::new(Duration::from_millis(500));
    assert!(probe.try_open("not a uri").is_err());
}
