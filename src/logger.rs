use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// 环境变量，取值 error|warn|info|debug|trace|off
pub const LOG_ENV: &str = "VDISK_LOG";

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "[ERROR]".red().bold(),
            Level::Warn => "[WARN ]".yellow().bold(),
            Level::Info => "[INFO ]".cyan(),
            Level::Debug => "[DEBUG]".bright_black(),
            Level::Trace => "[TRACE]".bright_black(),
        };
        eprintln!("{} {}", tag, record.args());
    }

    fn flush(&self) {}
}

pub fn level_from_env() -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// 安装全局 logger，重复调用无副作用
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        level_from_env()
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
