//! Toolpath container format implementations

pub mod v1;
