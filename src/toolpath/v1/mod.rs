//! FCode v1: self-describing binary toolpath container
//!
//! Layout: magic, length-prefixed and CRC-framed script section,
//! length-prefixed and CRC-framed metadata section, zero or more
//! length-prefixed preview blobs, 4-byte zero terminator.

pub mod constants;
pub mod encoder;
mod metadata;
pub mod sink;
pub mod tracker;
pub mod writer;

pub use encoder::{CommandEncoder, Diagnostic, Severity};
pub use sink::{ByteSink, FileSink, MemorySink, SinkState};
pub use tracker::KinematicState;
pub use writer::{FcodeFileWriter, FcodeMemoryWriter, FcodeWriter};
