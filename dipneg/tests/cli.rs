// The cargo_bin! macro requires build script setup that's overkill for simple tests.
// Suppress deprecation warning on the function until we need custom build-dir support.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use dipneg_bridge::{LocalBridgeServer, RandomPolicy};
use predicates::prelude::*;
use std::io::Write;
use std::thread;

const BOARD: &str = r#"{
    "turn": {"year": 1901, "phase": "Spring"},
    "powers": ["ENG", "FRA"],
    "provinces": [
        {"name": "LON", "supply_center": true, "owner": "ENG"},
        {"name": "PAR", "supply_center": true, "owner": "FRA"},
        {"name": "PIC"}
    ],
    "regions": [
        {"name": "LON", "province": "LON", "adjacent": ["PIC"]},
        {"name": "PAR", "province": "PAR", "adjacent": ["PIC"]},
        {"name": "PIC", "province": "PIC", "adjacent": ["LON", "PAR"]}
    ],
    "units": [
        {"power": "ENG", "region": "LON"},
        {"power": "FRA", "region": "PIC"}
    ]
}"#;

fn board_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(BOARD.as_bytes()).unwrap();
    file
}

#[test]
fn test_help_flag() {
    let output = std::process::Command::new(cargo_bin("dipneg"))
        .arg("--help")
        .output()
        .expect("failed to execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("probe"));
}

#[test]
fn test_probe_missing_board() {
    Command::cargo_bin("dipneg")
        .unwrap()
        .args([
            "probe",
            "--board",
            "/nonexistent/board.json",
            "--power",
            "ENG",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn test_probe_unreachable_bridge() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let board = board_file();

    Command::cargo_bin("dipneg")
        .unwrap()
        .arg("probe")
        .arg("--board")
        .arg(board.path())
        .args(["--power", "ENG", "--host", "127.0.0.1", "--port"])
        .arg(port.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn test_probe_against_local_server() {
    let server = LocalBridgeServer::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let mut policy = RandomPolicy::new(5);
        server.serve(&mut policy, Some(2));
    });
    let board = board_file();

    Command::cargo_bin("dipneg")
        .unwrap()
        .arg("probe")
        .arg("--board")
        .arg(board.path())
        .args(["--power", "ENG", "--port"])
        .arg(port.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("handshake: "));

    handle.join().unwrap();
}
