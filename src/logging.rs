/// File logger behind the `log` facade.
///
/// The terminal belongs to the renderer, so records go to a log file.
/// Warnings and errors are also kept in a short ring the HUD can show.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use std::sync::{LazyLock, Mutex};
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

const RECENT_CAP: usize = 4;

pub struct GameLog {
    started: Instant,
    file: Mutex<Option<File>>,
    recent: Mutex<VecDeque<String>>,
}

static GAME_LOG: LazyLock<GameLog> = LazyLock::new(GameLog::new);

impl GameLog {
    fn new() -> Self {
        GameLog {
            started: Instant::now(),
            file: Mutex::new(None),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAP)),
        }
    }

    fn set_file(&self, file: File) {
        if let Ok(mut slot) = self.file.lock() {
            *slot = Some(file);
        }
    }

    fn format_line(&self, record: &Record) -> String {
        let t = self.started.elapsed().as_secs_f32();
        let mut line = String::with_capacity(96);
        let _ = write!(line, "[{t:9.3}] {:<5} {}: {}", record.level(), record.target(), record.args());
        line
    }

    fn remember(&self, level: Level, text: String) {
        if level > Level::Warn {
            return;
        }
        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == RECENT_CAP {
                recent.pop_front();
            }
            recent.push_back(text);
        }
    }

    fn recent(&self) -> Vec<String> {
        self.recent.lock().map(|r| r.iter().cloned().collect()).unwrap_or_default()
    }
}

impl Log for GameLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format_line(record);
        if let Ok(mut slot) = self.file.lock() {
            if let Some(file) = slot.as_mut() {
                let _ = writeln!(file, "{line}");
            }
        }
        self.remember(record.level(), record.args().to_string());
    }

    fn flush(&self) {
        if let Ok(mut slot) = self.file.lock() {
            if let Some(file) = slot.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the logger. A log file that can't be opened leaves only the
/// in-memory ring; that failure is itself logged as a warning.
pub fn init(path: &Path, level: LevelFilter) {
    let opened = OpenOptions::new().create(true).append(true).open(path);
    let open_error = match opened {
        Ok(file) => {
            GAME_LOG.set_file(file);
            None
        }
        Err(e) => Some(e),
    };

    // A second install (tests, re-init) keeps the first logger.
    if log::set_logger(&*GAME_LOG).is_ok() {
        log::set_max_level(level);
    }

    if let Some(e) = open_error {
        log::warn!("could not open log file {}: {e}", path.display());
    }
}

/// Most recent warning/error messages, oldest first.
pub fn recent_warnings() -> Vec<String> {
    GAME_LOG.recent()
}

pub fn flush() {
    GAME_LOG.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn emit(sink: &GameLog, level: Level, msg: &str) {
        sink.log(
            &Record::builder()
                .level(level)
                .target("mageknight::test")
                .args(format_args!("{msg}"))
                .build(),
        );
    }

    #[test]
    fn ring_keeps_latest_warnings_only() {
        log::set_max_level(LevelFilter::Trace);
        let sink = GameLog::new();
        emit(&sink, Level::Info, "level loaded");
        for i in 0..6 {
            emit(&sink, Level::Warn, &format!("missing asset {i}"));
        }
        emit(&sink, Level::Error, "no audio");
        let recent = sink.recent();
        assert_eq!(recent.len(), RECENT_CAP);
        assert_eq!(recent.last().map(String::as_str), Some("no audio"));
        assert!(!recent.iter().any(|r| r == "level loaded"));
    }

    #[test]
    fn records_reach_the_file() {
        log::set_max_level(LevelFilter::Trace);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.log");
        let sink = GameLog::new();
        sink.set_file(File::create(&path).expect("create log"));
        emit(&sink, Level::Warn, "enemy fell out");
        sink.flush();
        let text = fs::read_to_string(&path).expect("read log");
        assert!(text.contains("WARN"));
        assert!(text.contains("mageknight::test: enemy fell out"));
    }
}
