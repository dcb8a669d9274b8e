// src/toolpath/v1/constants.rs
// Core format constants that never change

/// Container magic, first 8 bytes of every FCode v1 file
pub const MAGIC: &[u8; 8] = b"FCx0001\n";

/// End-of-file terminator written after the last preview
pub const TERMINATOR: &[u8] = &[0x00, 0x00, 0x00, 0x00];

// Command opcodes - part of the format spec
pub const OP_HOME: u8 = 0x01;
pub const OP_SLEEP: u8 = 0x04;
pub const OP_PAUSE_STANDBY: u8 = 0x05;
pub const OP_PAUSE_HOLD: u8 = 0x06;
pub const OP_SET_TEMP_NOWAIT: u8 = 0x10;
pub const OP_SET_TEMP_WAIT: u8 = 0x18;
pub const OP_SET_PWM: u8 = 0x20;
pub const OP_SET_FAN: u8 = 0x30;

/// Top bit marks a move; the low 7 bits are the payload flags
pub const OP_MOVE_MARKER: u8 = 0x80;

// Move payload flags. Fields present in the payload appear in descending
// bit order: feedrate, X, Y, Z, E0, E1, E2.
pub const FLAG_HAS_FEEDRATE: u8 = 64;
pub const FLAG_HAS_X: u8 = 32;
pub const FLAG_HAS_Y: u8 = 16;
pub const FLAG_HAS_Z: u8 = 8;
pub const FLAG_HAS_E0: u8 = 4;
pub const FLAG_HAS_E1: u8 = 2;
pub const FLAG_HAS_E2: u8 = 1;

// Default home position. Z sits at the top of the column on delta-style
// machines, hence the asymmetric default.
pub const DEFAULT_HOME_X: f32 = 0.0;
pub const DEFAULT_HOME_Y: f32 = 0.0;
pub const DEFAULT_HOME_Z: f32 = 240.0;

/// Fixed margin added to the tracked maxima in the reported extents
pub const EXTENT_SAFETY_MARGIN: f32 = 0.2;

/// Value of the VERSION metadata entry
pub const FORMAT_VERSION: &str = "1";
