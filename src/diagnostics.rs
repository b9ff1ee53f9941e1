//! Panic reporting.
//!
//! Callbacks and button actions run inside `catch_unwind` boundaries, so a
//! panic there is survivable.  The hook installed here makes sure every
//! panic (caught or not) also reaches the log with its thread and location,
//! instead of only going to stderr.

use core::any::Any;

/// Extract the human-readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Install a panic hook that routes panic info through `log::error!`.
///
/// Call once during init, after the logger is ready.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = panic_message(info.payload());
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        match info.location() {
            Some(loc) => log::error!(
                "PANIC in '{}' at {}:{}: {}",
                name,
                loc.file(),
                loc.line(),
                reason
            ),
            None => log::error!("PANIC in '{}': {}", name, reason),
        }
    }));
}
