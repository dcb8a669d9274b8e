//! fcode - FCode v1 toolpath container writer
//!
//! This crate encodes 3D-printer toolpath commands (moves, homing, heater,
//! fan, PWM, pauses, sleeps) into the self-describing FCode v1 binary
//! container, deriving job statistics (travel distance, time cost, extents,
//! filament usage) from the command stream and patching section lengths and
//! CRC-32 checksums back into the file during finalization.

// Enforce strict code quality and reliability
#![deny(
    // Safety
    unsafe_code,

    // Future compatibility
    future_incompatible,

    // Rust 2018 idioms
    rust_2018_idioms,
)]
#![warn(
    // Correctness
    missing_debug_implementations,
    unreachable_pub,

    // Documentation
    missing_docs,

    // Error handling best practices
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,

    // Code clarity and maintainability
    clippy::inefficient_to_string,
    clippy::clone_on_ref_ptr,
    clippy::wildcard_imports,
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::explicit_iter_loop,
)]
#![allow(
    // The moveto signature mirrors the wire contract field-for-field
    clippy::too_many_arguments,
    missing_docs,  // TODO: Complete documentation
)]

pub mod api;
pub mod exceptions;
pub mod logger;
pub mod toolpath;

// Re-export main API functions
pub use api::{JobOptions, build_file_writer, build_memory_writer};
pub use exceptions::FcodeError;

// Re-export format-specific types for direct usage
pub use toolpath::v1;
pub use toolpath::v1::{Diagnostic, FcodeFileWriter, FcodeMemoryWriter, FcodeWriter, Severity};
