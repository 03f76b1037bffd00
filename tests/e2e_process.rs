//! E2E tests for the host-side process wrapper
//!
//! `cat` echoes every line it receives, which makes it a convenient peer
//! that speaks the wire protocol. `true` stands in for a GUI that died.

#![cfg(unix)]

use photon_elf::ipc::{GuiProcess, IpcError, Message};
use std::process::Command;
use std::time::{Duration, Instant};

#[test]
fn test_send_and_recv_through_child() {
    let mut gui = GuiProcess::spawn_command(Command::new("cat")).unwrap();
    assert!(gui.is_running());

    gui.send(Message::Status("Connected".to_string()));
    gui.send(Message::CountRates(
        [("a".to_string(), 12.0)].into_iter().collect(),
    ));

    assert_eq!(
        gui.recv(Duration::from_secs(5)).unwrap(),
        Some(Message::Status("Connected".to_string()))
    );
    let Ok(Some(Message::CountRates(rates))) = gui.recv(Duration::from_secs(5)) else {
        panic!("expected count rates");
    };
    assert_eq!(rates["a"], 12.0);

    let status = gui.wait().unwrap();
    assert!(status.success());
}

#[test]
fn test_recv_with_zero_timeout_does_not_block() {
    let gui = GuiProcess::spawn_command(Command::new("cat")).unwrap();
    let start = Instant::now();
    assert_eq!(gui.recv(Duration::ZERO).unwrap(), None);
    assert!(start.elapsed() < Duration::from_secs(1));
    gui.wait().unwrap();
}

#[test]
fn test_recv_waits_out_timeout() {
    let gui = GuiProcess::spawn_command(Command::new("cat")).unwrap();
    let start = Instant::now();
    assert_eq!(gui.recv(Duration::from_millis(50)).unwrap(), None);
    assert!(start.elapsed() >= Duration::from_millis(50));
    gui.wait().unwrap();
}

#[test]
fn test_shutdown_sends_shutdown_message() {
    let mut gui = GuiProcess::spawn_command(Command::new("cat")).unwrap();
    gui.shutdown();
    assert_eq!(
        gui.recv(Duration::from_secs(5)).unwrap(),
        Some(Message::Shutdown)
    );
    gui.wait().unwrap();
}

#[test]
fn test_exited_child_reports_disconnect() {
    let mut gui = GuiProcess::spawn_command(Command::new("true")).unwrap();

    // A dead GUI is reported as a disconnect, not as an empty timeout
    let result = gui.recv(Duration::from_secs(5));
    assert!(matches!(result, Err(IpcError::Disconnected)));
    assert!(matches!(
        gui.recv(Duration::ZERO),
        Err(IpcError::Disconnected)
    ));

    // Sending into the dead pipe stays silent
    for _ in 0..3 {
        gui.send(Message::Status("nobody listening".to_string()));
    }
    gui.wait().unwrap();
}

#[test]
fn test_host_loop_stops_when_child_exits() {
    let mut gui = GuiProcess::spawn_command(Command::new("true")).unwrap();
    let timeout = Duration::from_millis(100);
    let start = Instant::now();

    let mut iterations = 0;
    let mut disconnected = false;
    while start.elapsed() < Duration::from_millis(500) {
        iterations += 1;
        gui.send(Message::Status("tick".to_string()));
        match gui.recv(timeout) {
            Ok(_) => {}
            Err(IpcError::Disconnected) => {
                disconnected = true;
                break;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert!(disconnected);
    assert!(iterations <= 6, "loop spun {} times", iterations);
    gui.wait().unwrap();
}

#[test]
fn test_wait_drains_a_chatty_child() {
    // `yes` floods stdout far past the inbound queue capacity
    let line = r#"{"key":"status","value":"spam"}"#;
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(format!("yes '{}' | head -n 5000", line));
    let gui = GuiProcess::spawn_command(command).unwrap();

    let status = gui.wait().unwrap();
    assert!(status.success());
}

#[test]
fn test_spawn_failure_is_reported() {
    let result = GuiProcess::spawn_command(Command::new("/nonexistent/photon-elf-gui"));
    assert!(matches!(result, Err(IpcError::SpawnFailed(_))));
}
