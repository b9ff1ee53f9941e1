//! Digital input adapters for the button lines.
//!
//! | Adapter          | Backing                                     |
//! |------------------|---------------------------------------------|
//! | `SimulatedInput` | nothing; every line reads inactive          |
//! | `HalInput<P>`    | any set of `embedded_hal` input pins        |
//! | `SysfsGpioInput` | Linux `/sys/class/gpio` value files         |
//!
//! Lines are active-low: a held button pulls the line to ground.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use embedded_hal::digital::{Error as _, ErrorKind, ErrorType, InputPin};
use log::{debug, info, warn};

use crate::app::ports::DigitalInput;
use crate::error::InputError;

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Input with no hardware behind it.  Setup always succeeds.
#[derive(Debug, Default)]
pub struct SimulatedInput;

impl DigitalInput for SimulatedInput {
    fn setup(&mut self, lines: &[u8]) -> Result<(), InputError> {
        info!("Simulated input: {} lines", lines.len());
        Ok(())
    }

    fn is_active(&mut self, _line: u8) -> bool {
        false
    }

    fn cleanup(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// embedded-hal pins
// ───────────────────────────────────────────────────────────────

/// Input over pre-claimed `embedded_hal` pins, keyed by line number.
pub struct HalInput<P> {
    pins: Vec<(u8, P)>,
}

impl<P: InputPin> HalInput<P> {
    pub fn new(pins: impl IntoIterator<Item = (u8, P)>) -> Self {
        Self {
            pins: pins.into_iter().collect(),
        }
    }

    fn pin(&mut self, line: u8) -> Option<&mut P> {
        self.pins.iter_mut().find(|(l, _)| *l == line).map(|(_, p)| p)
    }
}

/// Low level means pressed; a read error counts as released.
fn read_active<P: InputPin>(line: u8, pin: &mut P) -> bool {
    match pin.is_low() {
        Ok(low) => low,
        Err(e) => {
            debug!("Line {} read failed: {:?}", line, e.kind());
            false
        }
    }
}

impl<P: InputPin + Send> DigitalInput for HalInput<P> {
    fn setup(&mut self, lines: &[u8]) -> Result<(), InputError> {
        for &line in lines {
            if self.pin(line).is_none() {
                return Err(InputError::MissingPin(line));
            }
        }
        Ok(())
    }

    fn is_active(&mut self, line: u8) -> bool {
        self.pin(line).is_some_and(|pin| read_active(line, pin))
    }

    fn cleanup(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Linux sysfs GPIO
// ───────────────────────────────────────────────────────────────

/// Error from a sysfs value file.
#[derive(Debug)]
pub struct SysfsPinError(pub io::Error);

impl embedded_hal::digital::Error for SysfsPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One exported GPIO line read through its `value` file.
pub struct SysfsPin {
    value: File,
}

impl SysfsPin {
    pub fn open(value_path: &Path) -> io::Result<Self> {
        Ok(Self {
            value: File::open(value_path)?,
        })
    }

    fn read_level(&mut self) -> io::Result<bool> {
        let mut byte = [0u8; 1];
        self.value.seek(SeekFrom::Start(0))?;
        self.value.read_exact(&mut byte)?;
        Ok(byte[0] != b'0')
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsPinError;
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read_level().map_err(SysfsPinError)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Input over the legacy sysfs GPIO interface.
///
/// Lines not yet exported are exported on setup and unexported again on
/// cleanup; lines that were already exported are left as found.
pub struct SysfsGpioInput {
    root: PathBuf,
    pins: HalInput<SysfsPin>,
    exported: Vec<u8>,
}

impl SysfsGpioInput {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pins: HalInput::new([]),
            exported: Vec::new(),
        }
    }

    fn claim(&mut self, line: u8) -> io::Result<SysfsPin> {
        let dir = self.root.join(format!("gpio{line}"));
        if !dir.exists() {
            fs::write(self.root.join("export"), line.to_string())?;
            self.exported.push(line);
        }
        fs::write(dir.join("direction"), "in")?;
        SysfsPin::open(&dir.join("value"))
    }
}

impl DigitalInput for SysfsGpioInput {
    fn setup(&mut self, lines: &[u8]) -> Result<(), InputError> {
        if !self.root.is_dir() {
            return Err(InputError::Unavailable(format!(
                "{} not found",
                self.root.display()
            )));
        }
        for &line in lines {
            match self.claim(line) {
                Ok(pin) => self.pins.pins.push((line, pin)),
                Err(source) => {
                    self.cleanup();
                    return Err(InputError::Line { line, source });
                }
            }
        }
        info!("Sysfs GPIO: {} lines configured", lines.len());
        Ok(())
    }

    fn is_active(&mut self, line: u8) -> bool {
        self.pins.is_active(line)
    }

    fn cleanup(&mut self) {
        self.pins.pins.clear();
        for line in self.exported.drain(..) {
            if let Err(e) = fs::write(self.root.join("unexport"), line.to_string()) {
                warn!("Sysfs GPIO: unexport {} failed: {}", line, e);
            }
        }
    }
}
