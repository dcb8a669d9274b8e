//! FCode v1 container assembly
//!
//! Two-pass layout: the script and metadata sections are written with
//! zeroed length placeholders, then `finalize` seeks back to patch the
//! lengths and appends each section's CRC-32 once its byte count is known.

use super::constants::{MAGIC, TERMINATOR};
use super::encoder::{CommandEncoder, Diagnostic};
use super::metadata::system_entries;
use super::sink::{ByteSink, FileSink, MemorySink};
use super::tracker::KinematicState;
use crate::api::JobOptions;
use crate::exceptions::{FcodeError, Result};
use log::{debug, info, warn};
use std::fmt;

/// Writer assembling one FCode v1 container.
///
/// Commands are observed by the kinematic tracker first, then encoded, so
/// the metadata derived at finalize time reflects the whole stream.
/// `finalize` must run exactly once; a second call is rejected with
/// [`FcodeError::AlreadyFinalized`] rather than corrupting the patch-back
/// offsets.
pub struct FcodeWriter<S: ByteSink> {
    encoder: CommandEncoder<S>,
    state: KinematicState,
    head_type: String,
    metadata: Vec<(String, String)>,
    previews: Vec<Vec<u8>>,
    script_offset: u64,
    finalized: bool,
}

/// Writer assembling the container in memory
pub type FcodeMemoryWriter = FcodeWriter<MemorySink>;

/// Writer streaming the container to a file
pub type FcodeFileWriter = FcodeWriter<FileSink>;

impl<S: ByteSink> FcodeWriter<S> {
    /// Open a container on `sink`: writes the magic and reserves the script
    /// length field. Fails up front if the sink cannot report positions.
    pub fn new(sink: S, job: JobOptions) -> Result<Self> {
        let mut encoder = CommandEncoder::new(sink);
        debug!("📄 Starting FCode v1 container (head type '{}')", job.head_type);

        encoder.write_raw(MAGIC)?;
        let script_offset = encoder.stream_position().map_err(|err| {
            FcodeError::UnsupportedSink(format!("cannot establish script offset: {err}"))
        })?;
        encoder.write_raw(&[0u8; 4])?;

        Ok(FcodeWriter {
            encoder,
            state: KinematicState::default(),
            head_type: job.head_type,
            metadata: job.metadata,
            previews: job.previews,
            script_offset,
            finalized: false,
        })
    }

    /// Move the toolhead. `flags` selects which payload fields are present.
    pub fn moveto(
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
        if let Some(diag) = self
            .state
            .observe_move(flags, feedrate, x, y, z, e0, e1, e2)
        {
            self.encoder.record(diag);
        }
        self.encoder.moveto(flags, feedrate, x, y, z, e0, e1, e2)
    }

    /// Pause execution for `seconds` (encoded as milliseconds on the wire).
    pub fn sleep(&mut self, seconds: f32) -> Result<()> {
        self.state.observe_sleep(seconds);
        self.encoder.sleep(seconds)
    }

    /// Home all axes.
    pub fn home(&mut self) -> Result<()> {
        self.state.observe_home();
        self.encoder.home()
    }

    /// Pause the job, optionally parking at the standby position.
    pub fn pause(&mut self, to_standby_position: bool) -> Result<()> {
        self.encoder.pause(to_standby_position)
    }

    /// Set the toolhead heater target, optionally blocking until reached.
    pub fn set_toolhead_heater_temperature(&mut self, temperature: f32, wait: bool) -> Result<()> {
        self.encoder
            .set_toolhead_heater_temperature(temperature, wait)
    }

    /// Set the toolhead fan strength.
    pub fn set_toolhead_fan_speed(&mut self, strength: f32) -> Result<()> {
        self.encoder.set_toolhead_fan_speed(strength)
    }

    /// Set the toolhead PWM strength.
    pub fn set_toolhead_pwm(&mut self, strength: f32) -> Result<()> {
        self.encoder.set_toolhead_pwm(strength)
    }

    /// Not representable in format v1; recorded in the diagnostic log.
    pub fn enable_motor(&mut self) {
        self.encoder.enable_motor();
    }

    /// Not representable in format v1; recorded in the diagnostic log.
    pub fn disable_motor(&mut self) {
        self.encoder.disable_motor();
    }

    /// Comments have no v1 representation; ignored.
    pub fn append_comment(&mut self, _message: &str) {}

    /// Anchors have no v1 representation; ignored.
    pub fn append_anchor(&mut self, _value: u32) {}

    /// Record a caller-detected problem in the diagnostic log.
    pub fn record_issue(&mut self, critical: bool, message: &str) {
        let diag = if critical {
            Diagnostic::error(message)
        } else {
            Diagnostic::warning(message)
        };
        self.encoder.record(diag);
    }

    /// Ordered diagnostic log accumulated so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.encoder.diagnostics()
    }

    /// Tracked machine state and derived statistics.
    pub fn stats(&self) -> &KinematicState {
        &self.state
    }

    /// Close the container: patch the script length, append its CRC, write
    /// the metadata section, previews, and terminator, then close the sink.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(FcodeError::AlreadyFinalized);
        }

        // Phase 1: close the script section.
        let script_end = self.encoder.stream_position()?;
        let script_len = (script_end - self.script_offset - 4) as u32;
        self.encoder.seek_to(self.script_offset)?;
        self.encoder.write_raw(&script_len.to_le_bytes())?;
        self.encoder.seek_to(script_end)?;
        let script_crc = self.encoder.script_crc();
        self.encoder.write_raw(&script_crc.to_le_bytes())?;
        debug!(
            "✍️ Script section closed: {} bytes, crc32 {:08x}",
            script_len, script_crc
        );

        // Phase 2: metadata section, with its own placeholder and CRC.
        let metadata_offset = self.encoder.stream_position()?;
        self.encoder.write_raw(&[0u8; 4])?;

        let mut entries = system_entries(&self.head_type, &self.state);
        entries.extend_from_slice(&self.metadata);

        let mut metadata_crc = crc32fast::Hasher::new();
        for (key, value) in &entries {
            for chunk in [key.as_bytes(), b"=", value.as_bytes(), b"\x00"] {
                metadata_crc.update(chunk);
                self.encoder.write_raw(chunk)?;
            }
        }

        let metadata_end = self.encoder.stream_position()?;
        let metadata_len = (metadata_end - metadata_offset - 4) as u32;
        self.encoder.seek_to(metadata_offset)?;
        self.encoder.write_raw(&metadata_len.to_le_bytes())?;
        self.encoder.seek_to(metadata_end)?;
        self.encoder
            .write_raw(&metadata_crc.finalize().to_le_bytes())?;
        debug!(
            "✍️ Metadata section closed: {} bytes, {} entries",
            metadata_len,
            entries.len()
        );

        // Phase 3: previews, length-prefixed and uninstrumented.
        for preview in &self.previews {
            self.encoder
                .write_raw(&(preview.len() as u32).to_le_bytes())?;
            self.encoder.write_raw(preview)?;
        }

        // Phase 4: terminator, then release the sink.
        self.encoder.write_raw(TERMINATOR)?;
        self.finalized = true;
        self.encoder.close_sink()?;

        info!(
            "✅ Finalized FCode container: script {} bytes, metadata {} bytes, {} previews",
            script_len,
            metadata_len,
            self.previews.len()
        );
        Ok(())
    }
}

impl FcodeWriter<MemorySink> {
    /// Take the assembled container bytes, finalizing first if the caller
    /// has not done so. The returned buffer is always structurally valid.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if !self.finalized {
            self.finalize()?;
        }
        Ok(self.encoder.sink_mut().take_bytes())
    }
}

impl<S: ByteSink> Drop for FcodeWriter<S> {
    fn drop(&mut self) {
        if !self.finalized {
            warn!("⚠️ FCode container dropped without finalize; output is truncated");
        }
    }
}

impl<S: ByteSink + fmt::Debug> fmt::Debug for FcodeWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FcodeWriter")
            .field("encoder", &self.encoder)
            .field("state", &self.state)
            .field("head_type", &self.head_type)
            .field("finalized", &self.finalized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::constants::{
        FLAG_HAS_FEEDRATE, FLAG_HAS_X, FLAG_HAS_Y, MAGIC, OP_MOVE_MARKER, OP_SLEEP,
    };
    use super::*;
    use crate::api::{JobOptions, build_file_writer, build_memory_writer};
    use tempfile::TempDir;

    struct Sections<'a> {
        script: &'a [u8],
        script_crc: u32,
        meta: &'a [u8],
        meta_crc: u32,
        rest: &'a [u8],
    }

    fn split_sections(buf: &[u8]) -> Sections<'_> {
        assert_eq!(&buf[..8], MAGIC);
        let script_len = u32::from_le_bytes(buf[8..12].try_into().unwrap()) as usize;
        let script = &buf[12..12 + script_len];
        let mut at = 12 + script_len;
        let script_crc = u32::from_le_bytes(buf[at..at + 4].try_into().unwrap());
        at += 4;
        let meta_len = u32::from_le_bytes(buf[at..at + 4].try_into().unwrap()) as usize;
        at += 4;
        let meta = &buf[at..at + meta_len];
        at += meta_len;
        let meta_crc = u32::from_le_bytes(buf[at..at + 4].try_into().unwrap());
        at += 4;
        Sections {
            script,
            script_crc,
            meta,
            meta_crc,
            rest: &buf[at..],
        }
    }

    fn meta_entries(meta: &[u8]) -> Vec<(String, String)> {
        meta.split(|b| *b == 0)
            .filter(|record| !record.is_empty())
            .map(|record| {
                let text = std::str::from_utf8(record).unwrap();
                let (key, value) = text.split_once('=').unwrap();
                (key.to_string(), value.to_string())
            })
            .collect()
    }

    fn job(head_type: &str) -> JobOptions {
        JobOptions {
            head_type: head_type.to_string(),
            ..JobOptions::default()
        }
    }

    #[test]
    fn test_empty_container_is_structurally_valid() {
        let buf = build_memory_writer(job("EXTRUDER"))
            .unwrap()
            .into_bytes()
            .unwrap();

        let sections = split_sections(&buf);
        assert!(sections.script.is_empty());
        assert_eq!(sections.script_crc, crc32fast::hash(b""));
        assert_eq!(sections.meta_crc, crc32fast::hash(sections.meta));
        assert_eq!(sections.rest, TERMINATOR);
        assert_eq!(meta_entries(sections.meta).len(), 9);
    }

    #[test]
    fn test_single_move_scenario() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer
            .moveto(
                FLAG_HAS_FEEDRATE | FLAG_HAS_X | FLAG_HAS_Y,
                1200.0,
                10.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
            )
            .unwrap();
        writer.finalize().unwrap();
        let buf = writer.into_bytes().unwrap();

        let sections = split_sections(&buf);
        assert_eq!(sections.script.len(), 1 + 3 * 4);
        assert_eq!(
            sections.script[0],
            FLAG_HAS_FEEDRATE | FLAG_HAS_X | FLAG_HAS_Y | OP_MOVE_MARKER
        );
        let payload: Vec<f32> = sections.script[1..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(payload, [1200.0, 10.0, 0.0]);
        assert_eq!(sections.script_crc, crc32fast::hash(sections.script));

        let entries = meta_entries(sections.meta);
        let get = |key: &str| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("TRAVEL_DIST"), "10.00");
        assert_eq!(get("TIME_COST"), "0.50");
        assert_eq!(get("MAX_X"), "10.20");
        assert_eq!(get("MAX_R"), "10.20");
    }

    #[test]
    fn test_sleep_scenario() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer.sleep(2.5).unwrap();
        let buf = writer.into_bytes().unwrap();

        let sections = split_sections(&buf);
        assert_eq!(sections.script[0], OP_SLEEP);
        assert_eq!(
            f32::from_le_bytes(sections.script[1..5].try_into().unwrap()),
            2500.0
        );
        let entries = meta_entries(sections.meta);
        let time_cost = entries.iter().find(|(k, _)| k == "TIME_COST").unwrap();
        assert_eq!(time_cost.1, "2.50");
    }

    #[test]
    fn test_motor_commands_emit_nothing() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer.enable_motor();
        assert_eq!(writer.diagnostics().len(), 1);
        assert!(writer.diagnostics()[0].message.contains("NOT_SUPPORT"));

        let buf = writer.into_bytes().unwrap();
        assert!(split_sections(&buf).script.is_empty());
    }

    #[test]
    fn test_comment_and_anchor_are_silent_noops() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer.append_comment("layer 1");
        writer.append_anchor(7);
        assert!(writer.diagnostics().is_empty());
        let buf = writer.into_bytes().unwrap();
        assert!(split_sections(&buf).script.is_empty());
    }

    #[test]
    fn test_metadata_order_and_duplicate_keys() {
        let mut options = job("LASER");
        options.metadata = vec![
            ("AUTHOR".to_string(), "a".to_string()),
            ("AUTHOR".to_string(), "b".to_string()),
            ("SETTING".to_string(), "fast".to_string()),
        ];
        let buf = build_memory_writer(options)
            .unwrap()
            .into_bytes()
            .unwrap();

        let sections = split_sections(&buf);
        let keys: Vec<String> = meta_entries(sections.meta)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            [
                "VERSION",
                "HEAD_TYPE",
                "TIME_COST",
                "TRAVEL_DIST",
                "MAX_X",
                "MAX_Y",
                "MAX_Z",
                "MAX_R",
                "FILAMENT_USED",
                "AUTHOR",
                "AUTHOR",
                "SETTING",
            ]
        );
    }

    #[test]
    fn test_previews_written_in_order_before_terminator() {
        let mut options = job("EXTRUDER");
        options.previews = vec![vec![1, 2, 3], vec![9, 9]];
        let buf = build_memory_writer(options)
            .unwrap()
            .into_bytes()
            .unwrap();

        let sections = split_sections(&buf);
        let mut rest = sections.rest;
        for expected in [&[1u8, 2, 3][..], &[9, 9][..]] {
            let len = u32::from_le_bytes(rest[..4].try_into().unwrap()) as usize;
            assert_eq!(len, expected.len());
            assert_eq!(&rest[4..4 + len], expected);
            rest = &rest[4 + len..];
        }
        assert_eq!(rest, TERMINATOR);
    }

    #[test]
    fn test_second_finalize_rejected() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer.finalize().unwrap();
        assert!(matches!(
            writer.finalize(),
            Err(FcodeError::AlreadyFinalized)
        ));
    }

    #[test]
    fn test_record_issue_severities() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer.record_issue(true, "HEAD_OFFLINE");
        writer.record_issue(false, "SLOW_SEGMENT");
        assert_eq!(writer.diagnostics()[0].to_string(), "ERROR HEAD_OFFLINE");
        assert_eq!(writer.diagnostics()[1].to_string(), "WARNING SLOW_SEGMENT");
        writer.finalize().unwrap();
    }

    #[test]
    fn test_bad_feedrate_move_warns_but_still_encodes() {
        let mut writer = build_memory_writer(job("EXTRUDER")).unwrap();
        writer
            .moveto(FLAG_HAS_X, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0)
            .unwrap();
        assert_eq!(writer.diagnostics().len(), 1);
        assert!(writer.diagnostics()[0].message.contains("BAD_FEEDRATE"));

        let buf = writer.into_bytes().unwrap();
        let sections = split_sections(&buf);
        assert_eq!(sections.script.len(), 1 + 4);
    }

    #[test]
    fn test_file_writer_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("job.fc");

        let mut writer = build_file_writer(&path, job("EXTRUDER")).unwrap();
        writer
            .moveto(
                FLAG_HAS_FEEDRATE | FLAG_HAS_X,
                600.0,
                4.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
            )
            .unwrap();
        writer.sleep(1.0).unwrap();
        writer.finalize().unwrap();
        drop(writer);

        let buf = std::fs::read(&path).unwrap();
        let sections = split_sections(&buf);
        assert_eq!(sections.script_crc, crc32fast::hash(sections.script));
        assert_eq!(sections.meta_crc, crc32fast::hash(sections.meta));
        assert_eq!(sections.rest, TERMINATOR);
    }
}
