//! Byte sinks backing a container: in-memory buffer or file
//!
//! The container protocol patches length and checksum fields after the body
//! has been written, so every sink must support absolute seeks in addition
//! to appends.

use crate::exceptions::{FcodeError, Result};
use log::trace;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

/// Whether a sink still accepts writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkState {
    #[default]
    Open,
    Closed,
}

/// Random-access write destination for a container.
///
/// Writing to a closed sink is an explicit no-op contract: the bytes are
/// silently discarded and `Ok(())` is returned.
pub trait ByteSink {
    /// Write bytes at the current position, advancing it.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Current write position from the start of the destination.
    fn stream_position(&mut self) -> Result<u64>;

    /// Move the write position to an absolute offset.
    fn seek_to(&mut self, offset: u64) -> Result<()>;

    /// Stop accepting writes and release the destination.
    fn close(&mut self) -> Result<()>;

    /// Whether the sink still accepts writes.
    fn is_open(&self) -> bool;
}

/// Sink backed by a growable in-memory buffer
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: Vec<u8>,
    pos: usize,
    state: SinkState,
}

impl MemorySink {
    /// Create an empty, open sink
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Borrow the assembled bytes
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the assembled bytes out of the sink
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl ByteSink for MemorySink {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.state == SinkState::Closed {
            return Ok(());
        }
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }

    fn stream_position(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.pos = offset as usize;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        trace!("🔒 Closing memory sink ({} bytes)", self.buf.len());
        self.state = SinkState::Closed;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state == SinkState::Open
    }
}

/// Sink backed by a writable file handle
#[derive(Debug)]
pub struct FileSink {
    file: Option<File>,
    state: SinkState,
}

impl FileSink {
    /// Open `path` for writing, truncating any existing file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|err| {
            FcodeError::OpenOutput(format!(
                "failed to open '{}' for writing: {err}",
                path.display()
            ))
        })?;
        trace!("📄 Created output file: {:?}", path);
        Ok(FileSink {
            file: Some(file),
            state: SinkState::Open,
        })
    }
}

impl ByteSink for FileSink {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.state == SinkState::Closed {
            return Ok(());
        }
        match self.file.as_mut() {
            Some(file) => Ok(file.write_all(data)?),
            None => Ok(()),
        }
    }

    fn stream_position(&mut self) -> Result<u64> {
        match self.file.as_mut() {
            Some(file) => Ok(file.stream_position()?),
            None => Err(FcodeError::UnsupportedSink(
                "file sink is closed".to_string(),
            )),
        }
    }

    fn seek_to(&mut self, offset: u64) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => {
                file.seek(SeekFrom::Start(offset))?;
                Ok(())
            }
            None => Err(FcodeError::UnsupportedSink(
                "file sink is closed".to_string(),
            )),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        self.state = SinkState::Closed;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state == SinkState::Open
    }
}
