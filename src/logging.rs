//! File-backed `log` sink. The terminal belongs to the UI, so records go to a file or nowhere.

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
    start: Instant,
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut f) = self.file.lock() {
            // A failed write has nowhere to be reported.
            let _ = writeln!(
                f,
                "[{:>10.3}s {:<5} {}] {}",
                self.start.elapsed().as_secs_f64(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

/// Install the file logger when a path is given; otherwise logging stays off.
pub fn init(path: Option<&Path>, level: LevelFilter) -> Result<()> {
    let Some(path) = path else {
        log::set_max_level(LevelFilter::Off);
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    log::set_boxed_logger(Box::new(FileLogger {
        file: Mutex::new(file),
        level,
        start: Instant::now(),
    }))
    .context("failed to install logger")?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_writes_enabled_records_only() {
        let path = std::env::temp_dir().join("blockdrop-logging-test.log");
        let logger = FileLogger {
            file: Mutex::new(File::create(&path).unwrap()),
            level: LevelFilter::Info,
            start: Instant::now(),
        };
        for (level, msg) in [(Level::Info, "kept"), (Level::Debug, "dropped")] {
            logger.log(
                &Record::builder()
                    .level(level)
                    .target("blockdrop::game")
                    .args(format_args!("{msg}"))
                    .build(),
            );
        }
        logger.flush();
        let out = std::fs::read_to_string(&path).unwrap();
        assert!(out.contains("INFO  blockdrop::game] kept"));
        assert!(!out.contains("dropped"));
        let _ = std::fs::remove_file(path);
    }
}
