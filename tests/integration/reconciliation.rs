//! Integration tests for inventory reconciliation and persistence.

use onvifscan::inventory::{Access, Inventory};

use crate::common::{closed_record, error_record, ips, open_record};

// ===== Bulk-scan reconciliation =====

#[test]
fn test_full_scan_is_replace_and_prune() {
    let mut inv = Inventory::from_records(vec![open_record("10.0.0.1"), open_record("10.0.0.2")]);

    // This run saw .2 (now closed) and a new .3, but not .1
    inv.reconcile_full(vec![closed_record("10.0.0.2"), open_record("10.0.0.3")]);

    assert_eq!(ips(inv.records()), ["10.0.0.2", "10.0.0.3"]);
    assert_eq!(
        inv.get("10.0.0.2").map(|r| r.access),
        Some(Access::Close),
        "scanned record must overwrite the stale persisted one"
    );
    assert!(inv.get("10.0.0.1").is_none(), "unseen device is pruned");
}

#[test]
fn test_full_scan_preserves_surviving_positions() {
    let mut inv = Inventory::from_records(vec![
        open_record("10.0.0.1"),
        open_record("10.0.0.2"),
        open_record("10.0.0.3"),
    ]);

    // scanned order differs from persisted order; persisted positions win
    // for survivors, new entries go to the back
    inv.reconcile_full(vec![
        open_record("10.0.0.3"),
        open_record("10.0.0.9"),
        open_record("10.0.0.1"),
    ]);

    assert_eq!(ips(inv.records()), ["10.0.0.1", "10.0.0.3", "10.0.0.9"]);
}

#[test]
fn test_full_scan_applied_twice_is_stable() {
    let scanned = vec![open_record("10.0.0.5"), error_record("10.0.0.6")];
    let mut inv = Inventory::from_records(vec![open_record("10.0.0.1")]);
    inv.reconcile_full(scanned.clone());
    let after_once = inv.clone();
    inv.reconcile_full(scanned);
    assert_eq!(inv, after_once);
}

// ===== Single-device reconciliation =====

#[test]
fn test_upsert_appends_and_replaces() {
    let mut inv = Inventory::from_records(vec![open_record("10.0.0.1"), open_record("10.0.0.2")]);

    inv.reconcile_one(open_record("10.0.0.3"));
    assert_eq!(ips(inv.records()), ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

    inv.reconcile_one(error_record("10.0.0.2"));
    assert_eq!(
        ips(inv.records()),
        ["10.0.0.1", "10.0.0.2", "10.0.0.3"],
        "replacement preserves position"
    );
    assert_eq!(inv.get("10.0.0.2").map(|r| r.access), Some(Access::Error));
}

#[test]
fn test_upsert_is_idempotent() {
    let mut inv = Inventory::new();
    inv.reconcile_one(open_record("10.0.0.7"));
    let once = inv.clone();
    inv.reconcile_one(open_record("10.0.0.7"));
    assert_eq!(inv, once);
}

// ===== Persistence =====

#[test]
fn test_state_file_round_trip_through_both_policies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("onvif_devices.json");

    let mut inv = Inventory::load(&path);
    assert!(inv.is_empty(), "missing file starts empty");

    inv.reconcile_full(vec![open_record("10.0.0.1"), error_record("10.0.0.2")]);
    inv.save(&path).unwrap();

    let mut reloaded = Inventory::load(&path);
    assert_eq!(reloaded, inv);

    reloaded.reconcile_one(closed_record("10.0.0.1"));
    reloaded.save(&path).unwrap();

    let final_state = Inventory::load(&path);
    assert_eq!(ips(final_state.records()), ["10.0.0.1", "10.0.0.2"]);
    assert_eq!(
        final_state.get("10.0.0.1").map(|r| r.access),
        Some(Access::Close)
    );
}

#[test]
fn test_corrupt_state_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("onvif_devices.json");
    std::fs::write(&path, "[{\"ip\": \"truncated").unwrap();

    let inv = Inventory::load(&path);
    assert!(inv.is_empty(), "corruption degrades to empty prior state");
}

#[test]
fn test_persisted_wire_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("onvif_devices.json");
    Inventory::from_records(vec![closed_record("10.0.0.4"), error_record("10.0.0.5")])
        .save(&path)
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed[0]["access"], "close");
    assert_eq!(parsed[1]["access"], "error");
    assert_eq!(parsed[1]["rtsp"], serde_json::Value::Null);
    assert!(
        parsed[1]["rtsp_link"].as_str().unwrap().starts_with("Error: "),
        "sentinel marker is part of the wire contract"
    );
}
