//! StateRegister under concurrent writers.

use std::sync::{Arc, Mutex};
use std::thread;

use cyfox::state::{OperatingMode, OperatingState, StateRegister};

const STATES: [OperatingState; 4] = [
    OperatingState::Eating,
    OperatingState::Drinking,
    OperatingState::Scanning,
    OperatingState::Reading,
];

#[test]
fn concurrent_writes_are_observed_as_a_chain() {
    let reg = Arc::new(StateRegister::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        reg.register_state_callback(move |old, new| seen.lock().unwrap().push((old, new)));
    }

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                for i in 0..50 {
                    reg.set_state(STATES[(w + i) % STATES.len()]);
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 200);
    assert_eq!(seen[0].0, OperatingState::Idle);
    for pair in seen.windows(2) {
        assert_eq!(pair[0].1, pair[1].0, "old must equal the previous new");
    }
    assert_eq!(seen.last().unwrap().1, reg.state());
}

#[test]
fn state_reads_back_after_every_write() {
    let reg = StateRegister::new();
    for s in STATES {
        reg.set_state(s);
        assert_eq!(reg.state(), s);
    }
}

#[test]
fn mode_and_state_callbacks_are_independent() {
    let reg = Arc::new(StateRegister::new());
    let modes = Arc::new(Mutex::new(Vec::new()));
    let states = Arc::new(Mutex::new(Vec::new()));
    {
        let modes = Arc::clone(&modes);
        reg.register_mode_callback(move |_, new| modes.lock().unwrap().push(new));
        let states = Arc::clone(&states);
        reg.register_state_callback(move |_, new| states.lock().unwrap().push(new));
    }

    reg.set_mode(OperatingMode::Scanner);
    reg.set_state(OperatingState::Scanning);

    assert_eq!(*modes.lock().unwrap(), vec![OperatingMode::Scanner]);
    assert_eq!(*states.lock().unwrap(), vec![OperatingState::Scanning]);
    let snap = reg.snapshot();
    assert_eq!(snap.mode, OperatingMode::Scanner);
    assert_eq!(snap.state, OperatingState::Scanning);
}
