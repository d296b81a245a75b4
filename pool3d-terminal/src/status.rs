/// `log` backend for the terminal front end.
///
/// stdout belongs to the alternate screen while the scene runs, so records are not
/// printed; the most recent one is kept for the status line instead.
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::sync::Mutex;

pub struct StatusLogger {
    level: LevelFilter,
    last: Mutex<Option<String>>,
}

static LOGGER: StatusLogger = StatusLogger::new(LevelFilter::Info);

impl StatusLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level,
            last: Mutex::new(None),
        }
    }

    /// The last record logged, formatted for the status line.
    pub fn last_message(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl Log for StatusLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut last) = self.last.lock() {
            *last = Some(format!("{}: {}", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Installs the status logger as the global `log` backend.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LOGGER.level))
}

/// Last message captured by the global logger.
pub fn last_message() -> Option<String> {
    LOGGER.last_message()
}
