//! GPIO line assignments for the Argon40 POD display buttons.
//!
//! Single source of truth for the default button wiring; the config file
//! can override each line (`cyfox.buttons.buttonN`).  Numbers are BCM
//! line numbers on the Raspberry Pi header.

/// Button 1: acknowledge reminder.
pub const BUTTON1_LINE: u8 = 5;
/// Button 2: next feed item.
pub const BUTTON2_LINE: u8 = 6;
/// Button 3: start network scan.
pub const BUTTON3_LINE: u8 = 13;
/// Button 4: cycle mode.
pub const BUTTON4_LINE: u8 = 19;

/// Default lines indexed by `button - 1`.
pub const BUTTON_LINES: [u8; 4] = [BUTTON1_LINE, BUTTON2_LINE, BUTTON3_LINE, BUTTON4_LINE];

/// Legacy sysfs GPIO interface root.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";
