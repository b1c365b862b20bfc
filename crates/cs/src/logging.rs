#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, Config, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cs_platform::AppPaths;

pub const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Appends to the log file, reopening it if it was deleted while we run.
struct ReopeningFileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ReopeningFileWriter {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = open_append(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        if guard.is_none() || !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            *guard = Some(open_append(&self.path)?);
        }

        match guard.as_mut() {
            Some(file) => op(file),
            None => Err(io::Error::other("log file not available")),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for ReopeningFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

/// Bytes kept from the end of an oversized log.
const TRIMMED_LOG_SIZE: u64 = MAX_LOG_SIZE / 4;

/// Keeps only the newest `keep` bytes of the log once it grows past `max`,
/// starting at the first complete line. Returns whether the file was cut.
fn trim_log_file(log_path: &Path, max: u64, keep: u64) -> io::Result<bool> {
    if std::fs::metadata(log_path)?.len() <= max {
        return Ok(false);
    }

    let contents = std::fs::read(log_path)?;
    let tail_start = contents
        .len()
        .saturating_sub(usize::try_from(keep).unwrap_or(usize::MAX));
    let line_start = if tail_start == 0 || contents[tail_start - 1] == b'\n' {
        tail_start
    } else {
        contents[tail_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(contents.len(), |pos| tail_start + pos + 1)
    };

    std::fs::write(log_path, &contents[line_start..])?;
    Ok(true)
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("cs")
        .build()
}

/// Installs the global logger. Output stays off unless `enabled`, so the
/// logger can be installed unconditionally.
pub fn init_logging(paths: &AppPaths, enabled: bool) {
    let log_path = paths.log_file();
    if paths.ensure_dirs().is_ok()
        && let Err(error) = trim_log_file(&log_path, MAX_LOG_SIZE, TRIMMED_LOG_SIZE)
        && error.kind() != io::ErrorKind::NotFound
    {
        eprintln!("Could not trim {}: {error}", log_path.display());
    }

    let config = log_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    match ReopeningFileWriter::open(log_path.clone()) {
        Ok(writer) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, writer)),
        Err(error) if enabled => {
            eprintln!("Could not open {}: {error}", log_path.display());
        }
        Err(_) => {}
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }

    log::set_max_level(max_level(enabled));

    if enabled {
        log::info!(
            "cs {} started, logging to {}",
            env!("CARGO_PKG_VERSION"),
            log_path.display()
        );
    }
}

fn max_level(enabled: bool) -> LevelFilter {
    if enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Off
    }
}
