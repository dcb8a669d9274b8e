//! JSON structured logging implementation for fcode
//!
//! Library code only uses the `log` facade; embedding applications (or
//! tests) opt into output here. `FCODE_LOG_LEVEL` selects the mode: a plain
//! level name routes through `env_logger`, a `json:` prefix switches to
//! line-delimited JSON on stderr or the file named by `FCODE_LOG_PATH`.

use chrono::{Local, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON logger implementation
#[derive(Debug)]
pub struct JsonLogger {
    level: Level,
    target_file: Mutex<Option<std::fs::File>>,
}

/// Split a level spec like "json:debug" into (json mode, level name).
fn parse_level_spec(spec: &str) -> (bool, &str) {
    if let Some(stripped) = spec.strip_prefix("json:") {
        (true, stripped)
    } else if spec == "json" {
        (true, "info")
    } else {
        (false, spec)
    }
}

fn level_filter(name: &str) -> LevelFilter {
    match name {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

impl JsonLogger {
    /// Create a new JSON logger writing to `log_path` or stderr
    pub fn new(level: Level, log_path: Option<String>) -> Self {
        let target_file = log_path
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
        JsonLogger {
            level,
            target_file: Mutex::new(target_file),
        }
    }

    /// Initialize logging from an explicit level spec.
    pub fn init_with_level(level_str: &str) {
        let (use_json, level_name) = parse_level_spec(level_str);

        if !use_json {
            // Plain mode: env_logger with the 🦀-prefixed format
            env_logger::Builder::new()
                .filter_level(level_filter(level_name))
                .format(|buf, record| {
                    write!(buf, "🦀 ")?;
                    write!(
                        buf,
                        "[{} {} {}] ",
                        Local::now().format("%Y-%m-%dT%H:%M:%SZ"),
                        record.level(),
                        record.target()
                    )?;
                    writeln!(buf, "{}", record.args())
                })
                .init();
            return;
        }

        let level = level_filter(level_name).to_level().unwrap_or(Level::Info);
        let log_path = env::var("FCODE_LOG_PATH").ok();
        let logger = Box::new(JsonLogger::new(level, log_path));
        if let Err(err) = log::set_boxed_logger(logger) {
            eprintln!("Failed to initialize JSON logger: {err}");
            return;
        }
        log::set_max_level(level.to_level_filter());
    }

    /// Initialize logging from `FCODE_LOG_LEVEL` (default "info").
    pub fn init() {
        let spec = env::var("FCODE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self::init_with_level(&spec);
    }
}

impl Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = serde_json::json!({
            "@timestamp": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            "@level": record.level().to_string().to_lowercase(),
            "@message": record.args().to_string(),
            "@module": record.target(),
            "@pid": std::process::id(),
        });
        let line = format!("{}\n", serde_json::to_string(&entry).unwrap_or_default());

        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.write_all(line.as_bytes());
                let _ = file.flush();
                return;
            }
        }
        let _ = io::stderr().write_all(line.as_bytes());
        let _ = io::stderr().flush();
    }

    fn flush(&self) {
        if let Ok(mut file_guard) = self.target_file.lock() {
            if let Some(ref mut file) = *file_guard {
                let _ = file.flush();
            }
        }
        let _ = io::stderr().flush();
    }
}

/// Whether `FCODE_LOG_LEVEL` selects JSON output
pub fn is_json_logging() -> bool {
    env::var("FCODE_LOG_LEVEL")
        .map(|v| v.starts_with("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_spec() {
        assert_eq!(parse_level_spec("debug"), (false, "debug"));
        assert_eq!(parse_level_spec("json"), (true, "info"));
        assert_eq!(parse_level_spec("json:trace"), (true, "trace"));
    }

    #[test]
    fn test_level_filter_defaults_to_info() {
        assert_eq!(level_filter("warn"), LevelFilter::Warn);
        assert_eq!(level_filter("bogus"), LevelFilter::Info);
    }
}
