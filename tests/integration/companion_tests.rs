//! Coordinator wiring: commands, callbacks, events, and lifecycle.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use cyfox::app::commands::AppCommand;
use cyfox::app::events::AppEvent;
use cyfox::app::service::{Adapters, Companion};
use cyfox::config::CompanionConfig;
use cyfox::scheduler::ReminderKind;
use cyfox::state::{OperatingMode, OperatingState};

use crate::mock_hw::{
    InputHandle, ManualClock, MockHttp, MockInput, MockProbe, RecordingSink, Reply, listing,
    wait_until,
};

struct Rig {
    companion: Companion,
    sink: Arc<RecordingSink>,
    input: InputHandle,
    http: Arc<MockHttp>,
}

fn rig() -> Rig {
    let mut config = CompanionConfig::default();
    config.scanner.network_range = "10.9.0.0/30".into();
    config.scanner.ports = vec![22];
    config.feed.sources = vec!["news".into()];
    config.feed.source_delay_ms = 0;
    config.feed.url_template = "http://feeds.test/{source}".into();

    let (input, handle) = MockInput::new();
    let http = MockHttp::new();
    http.reply(
        "http://feeds.test/news",
        Reply::Json(200, listing(&[("top", 9), ("mid", 5), ("low", 1)])),
    );
    let sink = RecordingSink::new();
    let adapters = Adapters {
        input: Box::new(input),
        http: http.clone(),
        probe: Arc::new(MockProbe::with_open(&[(Ipv4Addr::new(10, 9, 0, 1), 22)])),
        clock: ManualClock::new(),
        sink: sink.clone(),
    };
    Rig {
        companion: Companion::new(&config, adapters).unwrap(),
        sink,
        input: handle,
        http,
    }
}

#[test]
fn cycle_mode_sets_matching_state() {
    let rig = rig();
    let c = &rig.companion;

    assert!(c.handle_command(AppCommand::CycleMode));
    assert_eq!(c.register().mode(), OperatingMode::Scanner);
    assert_eq!(c.register().state(), OperatingState::Idle);

    c.handle_command(AppCommand::CycleMode);
    assert_eq!(c.register().mode(), OperatingMode::Feed);
    assert_eq!(c.register().state(), OperatingState::Reading);

    c.handle_command(AppCommand::CycleMode);
    assert_eq!(c.register().mode(), OperatingMode::Buddy);
    assert_eq!(c.register().state(), OperatingState::Idle);

    let mode_events = rig.sink.count(|e| matches!(e, AppEvent::ModeChanged { .. }));
    assert_eq!(mode_events, 3);
}

#[test]
fn next_post_only_in_feed_mode() {
    let rig = rig();
    let c = &rig.companion;
    c.feed().fetch_new_posts();

    assert!(!c.handle_command(AppCommand::NextPost));
    assert_eq!(c.feed().cursor(), 0);

    c.register().set_mode(OperatingMode::Feed);
    assert!(c.handle_command(AppCommand::NextPost));
    assert_eq!(c.feed().cursor(), 1);
    assert_eq!(c.register().state(), OperatingState::Reading);
}

#[test]
fn acknowledge_in_alert_or_buddy_only() {
    let rig = rig();
    let c = &rig.companion;
    assert_eq!(c.reminders().tick(), Some(ReminderKind::Eat));

    c.register().set_mode(OperatingMode::Feed);
    assert!(!c.handle_command(AppCommand::Acknowledge));
    assert!(!c.reminders().reminder(ReminderKind::Eat).acknowledged);

    c.register().set_state(OperatingState::Alert);
    assert!(c.handle_command(AppCommand::Acknowledge));
    assert!(c.reminders().reminder(ReminderKind::Eat).acknowledged);
    assert_eq!(c.register().state(), OperatingState::Idle);
}

#[test]
fn scan_command_needs_scanner_mode() {
    let rig = rig();
    let c = &rig.companion;
    assert!(!c.handle_command(AppCommand::Scan));
    c.register().set_mode(OperatingMode::Scanner);
    assert!(c.handle_command(AppCommand::Scan));
}

#[test]
fn scan_in_scanner_mode_returns_to_idle_via_coordinator() {
    let rig = rig();
    let c = &rig.companion;
    c.register().set_mode(OperatingMode::Scanner);

    let results = c.scanner().scan_network().unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(c.register().state(), OperatingState::Idle);
    assert!(rig.sink.events().contains(&AppEvent::ScanCompleted { hosts: 1 }));
}

#[test]
fn reminder_fire_is_reported() {
    let rig = rig();
    rig.companion.reminders().tick();
    let fired = rig
        .sink
        .count(|e| matches!(e, AppEvent::ReminderFired { kind: ReminderKind::Eat, .. }));
    assert_eq!(fired, 1);
    assert!(rig.sink.events().contains(&AppEvent::StateChanged {
        from: OperatingState::Idle,
        to: OperatingState::Eating,
    }));
}

#[test]
fn status_snapshot_reflects_workers() {
    let rig = rig();
    let c = &rig.companion;
    c.feed().fetch_new_posts();
    c.reminders().tick();

    let status = c.emit_status();

    assert_eq!(status.state, OperatingState::Eating);
    assert_eq!(status.mode, OperatingMode::Buddy);
    assert_eq!(status.active_reminder, Some(ReminderKind::Eat));
    assert_eq!(status.feed_items, 3);
    assert_eq!(status.current_title.as_deref(), Some("top"));
    assert!(status.last_scan.is_none());
    assert!(rig.sink.events().contains(&AppEvent::Status(status)));
}

#[test]
fn button_four_cycles_mode_end_to_end() {
    let rig = rig();
    let c = &rig.companion;
    c.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || rig.http.request_count() >= 1));

    rig.input.press(c.buttons().line_for(4).unwrap());
    assert!(wait_until(Duration::from_secs(2), || {
        c.register().mode() == OperatingMode::Scanner
    }));

    c.stop();
    c.stop();
    assert!(!c.is_running());
    let started = rig.sink.count(|e| matches!(e, AppEvent::Started { .. }));
    assert_eq!(started, 1);
}
