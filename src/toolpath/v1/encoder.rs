//! FCode v1 command encoding
//!
//! Translates semantic toolpath commands into opcode + fixed-field binary
//! payloads. All floats are 4-byte little-endian. Script bytes feed the
//! script CRC-32 as they are written; raw writes (magic, length fields,
//! checksums, previews) bypass it.

use super::constants::{
    FLAG_HAS_E0, FLAG_HAS_E1, FLAG_HAS_E2, FLAG_HAS_FEEDRATE, FLAG_HAS_X, FLAG_HAS_Y, FLAG_HAS_Z,
    OP_HOME, OP_MOVE_MARKER, OP_PAUSE_HOLD, OP_PAUSE_STANDBY, OP_SET_FAN, OP_SET_PWM,
    OP_SET_TEMP_NOWAIT, OP_SET_TEMP_WAIT, OP_SLEEP,
};
use super::sink::ByteSink;
use crate::exceptions::Result;
use crc32fast::Hasher;
use std::fmt;

/// Severity of a diagnostic log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One entry in the ordered, append-only diagnostic log.
///
/// Diagnostics never abort the write sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Create an error entry
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Create a warning entry
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "ERROR {}", self.message),
            Severity::Warning => write!(f, "WARNING {}", self.message),
        }
    }
}

/// Encodes commands into the script section of a container.
///
/// Owns the sink, the script checksum accumulator, and the diagnostic log.
pub struct CommandEncoder<S: ByteSink> {
    sink: S,
    script_crc: Hasher,
    diagnostics: Vec<Diagnostic>,
}

impl<S: ByteSink> CommandEncoder<S> {
    pub(crate) fn new(sink: S) -> Self {
        CommandEncoder {
            sink,
            script_crc: Hasher::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Write bytes without touching the script checksum.
    pub(crate) fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.sink.write_all(data)
    }

    fn write_script(&mut self, data: &[u8]) -> Result<()> {
        self.script_crc.update(data);
        self.sink.write_all(data)
    }

    fn write_command(&mut self, cmd: u8) -> Result<()> {
        self.write_script(&[cmd])
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_script(&value.to_le_bytes())
    }

    /// CRC-32 of the script bytes written so far.
    pub(crate) fn script_crc(&self) -> u32 {
        self.script_crc.clone().finalize()
    }

    pub(crate) fn stream_position(&mut self) -> Result<u64> {
        self.sink.stream_position()
    }

    pub(crate) fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.sink.seek_to(offset)
    }

    pub(crate) fn close_sink(&mut self) -> Result<()> {
        self.sink.close()
    }

    pub(crate) fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Emit a move. The opcode byte carries the flags verbatim; the feedrate
    /// field is only present when its flag is set and the value is positive,
    /// even though the flag bit stays set in the opcode.
    pub(crate) fn moveto(
        &mut self,
        flags: u8,
        feedrate: f32,
        x: f32,
        y: f32,
        z: f32,
        e0: f32,
        e1: f32,
        e2: f32,
    ) -> Result<()> {
        self.write_command(flags | OP_MOVE_MARKER)?;
        if flags & FLAG_HAS_FEEDRATE != 0 && feedrate > 0.0 {
            self.write_f32(feedrate)?;
        }
        if flags & FLAG_HAS_X != 0 {
            self.write_f32(x)?;
        }
        if flags & FLAG_HAS_Y != 0 {
            self.write_f32(y)?;
        }
        if flags & FLAG_HAS_Z != 0 {
            self.write_f32(z)?;
        }
        if flags & FLAG_HAS_E0 != 0 {
            self.write_f32(e0)?;
        }
        if flags & FLAG_HAS_E1 != 0 {
            self.write_f32(e1)?;
        }
        if flags & FLAG_HAS_E2 != 0 {
            self.write_f32(e2)?;
        }
        Ok(())
    }

    /// Emit a sleep. The wire payload is in milliseconds.
    pub(crate) fn sleep(&mut self, seconds: f32) -> Result<()> {
        self.write_command(OP_SLEEP)?;
        self.write_f32(seconds * 1000.0)
    }

    pub(crate) fn pause(&mut self, to_standby_position: bool) -> Result<()> {
        self.write_command(if to_standby_position {
            OP_PAUSE_STANDBY
        } else {
            OP_PAUSE_HOLD
        })
    }

    pub(crate) fn home(&mut self) -> Result<()> {
        self.write_command(OP_HOME)
    }

    pub(crate) fn set_toolhead_heater_temperature(
        &mut self,
        temperature: f32,
        wait: bool,
    ) -> Result<()> {
        self.write_command(if wait { OP_SET_TEMP_WAIT } else { OP_SET_TEMP_NOWAIT })?;
        self.write_f32(temperature)
    }

    pub(crate) fn set_toolhead_fan_speed(&mut self, strength: f32) -> Result<()> {
        self.write_command(OP_SET_FAN)?;
        self.write_f32(strength)
    }

    pub(crate) fn set_toolhead_pwm(&mut self, strength: f32) -> Result<()> {
        self.write_command(OP_SET_PWM)?;
        self.write_f32(strength)
    }

    /// Not representable in format v1; logged instead of emitted.
    pub(crate) fn enable_motor(&mut self) {
        self.record(Diagnostic::error("NOT_SUPPORT ENABLE_MOTOR"));
    }

    /// Not representable in format v1; logged instead of emitted.
    pub(crate) fn disable_motor(&mut self) {
        self.record(Diagnostic::error("NOT_SUPPORT DISABLE_MOTOR"));
    }
}

impl<S: ByteSink + fmt::Debug> fmt::Debug for CommandEncoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEncoder")
            .field("sink", &self.sink)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
