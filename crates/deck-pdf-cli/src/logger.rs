use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;

const OWN_TARGETS: [&str; 4] = ["deckpdf", "deck_resolver", "card_images", "card_sheets"];

/// Timestamped logger writing to stderr.
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// `-q` wins over `-v`; each `-v` adds one level above info.
    pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
        match (quiet, verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // dependency debug output only at -vv
        if record.level() >= Level::Debug
            && self.level < LevelFilter::Trace
            && !OWN_TARGETS
                .iter()
                .any(|target| record.target().starts_with(target))
        {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{} {:<5} {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
