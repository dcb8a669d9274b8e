//! High-level API for producing FCode containers

use crate::exceptions::Result;
use crate::toolpath::v1::{FcodeFileWriter, FcodeMemoryWriter, FcodeWriter, FileSink, MemorySink};
use std::path::Path;

/// Per-job inputs for a container
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    /// Toolhead type reported in the HEAD_TYPE metadata entry (e.g. "EXTRUDER")
    pub head_type: String,
    /// Caller metadata entries, written after the system entries in order.
    /// Duplicate keys are written verbatim.
    pub metadata: Vec<(String, String)>,
    /// Preview blobs (e.g. PNG thumbnails), appended without checksums
    pub previews: Vec<Vec<u8>>,
}

/// Create a writer that assembles the container in memory.
pub fn build_memory_writer(job: JobOptions) -> Result<FcodeMemoryWriter> {
    FcodeWriter::new(MemorySink::new(), job)
}

/// Create a writer that streams the container to a file. The file is
/// created immediately; failure to open it is surfaced here.
pub fn build_file_writer(output_path: &Path, job: JobOptions) -> Result<FcodeFileWriter> {
    let sink = FileSink::create(output_path)?;
    FcodeWriter::new(sink, job)
}
