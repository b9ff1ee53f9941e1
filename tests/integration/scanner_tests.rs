//! Network scanner against a mock probe.

use std::net::Ipv4Addr;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cyfox::config::ScannerConfig;
use cyfox::error::ScanError;
use cyfox::scanner::NetworkScanner;
use cyfox::state::{OperatingMode, OperatingState, StateRegister};

use crate::mock_hw::{MockProbe, wait_until};

fn config(range: &str) -> ScannerConfig {
    ScannerConfig {
        network_range: range.to_string(),
        ports: vec![22, 80, 443],
        ..ScannerConfig::default()
    }
}

fn scanner(range: &str, probe: MockProbe) -> (NetworkScanner, Arc<StateRegister>, Arc<MockProbe>) {
    let register = Arc::new(StateRegister::new());
    let probe = Arc::new(probe);
    let scanner = NetworkScanner::new(config(range), Arc::clone(&register), probe.clone());
    (scanner, register, probe)
}

#[test]
fn closed_slash_30_is_empty() {
    let (scanner, _register, probe) = scanner("192.168.7.0/30", MockProbe::default());
    let results = scanner.scan_network().unwrap();
    assert!(results.is_empty());
    // Two usable hosts, three ports each.
    assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
}

#[test]
fn open_ssh_port_is_reported() {
    let host = Ipv4Addr::new(192, 168, 7, 2);
    let (scanner, _register, _probe) = scanner("192.168.7.0/30", MockProbe::with_open(&[(host, 22)]));

    let results = scanner.scan_network().unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].host, host);
    assert_eq!(results[0].ports, vec![22]);
    assert_eq!(results[0].services.get(&22).map(String::as_str), Some("SSH"));
    assert!(results[0].vulnerabilities.is_empty());
    assert_eq!(scanner.results(), results);
}

#[test]
fn working_set_is_capped_at_ten_hosts() {
    let (scanner, _register, probe) = scanner("10.1.0.0/16", MockProbe::default());
    scanner.scan_network().unwrap();
    assert_eq!(probe.calls.load(Ordering::SeqCst), 10 * 3);
}

#[test]
fn risky_port_gets_an_advisory() {
    let host = Ipv4Addr::new(10, 0, 0, 1);
    let register = Arc::new(StateRegister::new());
    let cfg = ScannerConfig {
        network_range: "10.0.0.1/32".into(),
        ports: vec![3306, 3389],
        ..ScannerConfig::default()
    };
    let probe = Arc::new(MockProbe::with_open(&[(host, 3306), (host, 3389)]));
    let scanner = NetworkScanner::new(cfg, register, probe);

    let results = scanner.scan_network().unwrap();
    assert_eq!(results[0].ports, vec![3306, 3389]);
    assert_eq!(results[0].vulnerabilities.len(), 2);
    assert_eq!(results[0].services[&3389], "RDP");
}

#[test]
fn overlapping_scan_is_rejected() {
    let probe = MockProbe {
        delay: Duration::from_millis(100),
        ..MockProbe::default()
    };
    let (scanner, _register, _probe) = scanner("10.0.0.1/32", probe);
    let scanner = Arc::new(scanner);

    let background = {
        let scanner = Arc::clone(&scanner);
        std::thread::spawn(move || scanner.scan_network())
    };
    assert!(wait_until(Duration::from_secs(2), || scanner.is_scanning()));
    assert!(matches!(scanner.scan_network(), Err(ScanError::InProgress)));

    assert!(background.join().unwrap().is_ok());
    assert!(!scanner.is_scanning());
}

#[test]
fn callback_fires_even_for_empty_scan() {
    let (scanner, _register, _probe) = scanner("10.0.0.0/30", MockProbe::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        scanner.register_scan_callback(move |results| seen.lock().unwrap().push(results.len()));
    }
    scanner.scan_network().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0]);
}

#[test]
fn state_is_scanning_during_scan() {
    let (scanner, register, _probe) = scanner("10.0.0.0/30", MockProbe::default());
    let states = Arc::new(Mutex::new(Vec::new()));
    {
        let states = Arc::clone(&states);
        register.register_state_callback(move |_, new| states.lock().unwrap().push(new));
    }
    scanner.scan_network().unwrap();
    assert_eq!(
        *states.lock().unwrap(),
        vec![OperatingState::Scanning, OperatingState::Idle]
    );
}

#[test]
fn request_scan_runs_outside_scanner_mode() {
    let cfg = ScannerConfig {
        scan_interval_secs: 3600,
        ..config("10.0.0.0/30")
    };
    let register = Arc::new(StateRegister::new());
    let probe = Arc::new(MockProbe::default());
    let scanner = NetworkScanner::new(cfg, Arc::clone(&register), probe.clone());
    assert_eq!(register.mode(), OperatingMode::Buddy);

    scanner.start().unwrap();
    // Buddy mode: the first loop pass does not scan.
    std::thread::sleep(Duration::from_millis(50));
    assert!(scanner.last_scan().is_none());

    scanner.request_scan();
    assert!(wait_until(Duration::from_secs(2), || scanner.last_scan().is_some()));
    scanner.stop();
    assert!(!scanner.is_running());
}

#[test]
fn periodic_scan_runs_in_scanner_mode() {
    let register = Arc::new(StateRegister::new());
    register.set_mode(OperatingMode::Scanner);
    let scanner = NetworkScanner::new(
        config("10.0.0.0/30"),
        Arc::clone(&register),
        Arc::new(MockProbe::default()),
    );
    scanner.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || scanner.last_scan().is_some()));
    scanner.stop();
    // Scanner mode: the scanner leaves the state for the coordinator.
    assert_eq!(register.state(), OperatingState::Scanning);
}
