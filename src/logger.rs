use chrono::{DateTime, Local};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

static CONSOLE_LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);
static INSTALLED: AtomicBool = AtomicBool::new(false);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

/// Installs the process-wide logger. A second call only swaps the config.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let level = config.min_level.to_level_filter();
    let file_outcome = CONSOLE_LOGGER.update_config(config);
    log::set_max_level(level);

    if !INSTALLED.swap(true, Ordering::SeqCst) {
        log::set_logger(&*CONSOLE_LOGGER)
            .map_err(|e| format!("Failed to set logger: {:?}", e))?;
    }
    file_outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_module: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_module: true,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    /// Quiet preset for normal CLI runs: warnings and errors only.
    pub fn cli() -> Self {
        Self {
            min_level: LogLevel::Warn,
            show_module: false,
            include_timestamp: false,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            ..Default::default()
        }
    }
}

/// Writes log records to stderr, stdout belongs to command output.
pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    /// Applies the config even when the log file cannot be opened; console
    /// output keeps working and the open failure is returned.
    fn update_config(&self, mut new_config: LoggerConfig) -> Result<(), String> {
        let (file, outcome) = match new_config.log_file_path.clone().as_deref() {
            None => (None, Ok(())),
            Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => (Some(file), Ok(())),
                Err(e) => {
                    new_config.log_file_path = None;
                    (None, Err(format!("Failed to open log file {}: {}", path, e)))
                }
            },
        };

        if let Ok(mut log_file) = self.log_file.lock() {
            *log_file = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
        outcome
    }

    fn format_line(&self, record: &Record, at: DateTime<Local>, config: &LoggerConfig) -> String {
        let level = LogLevel::from_level(record.level());
        let mut output = String::new();

        if config.include_timestamp {
            let timestamp = at.format(&config.timestamp_format).to_string();
            if config.show_colors {
                output.push_str(&format!("{} ", timestamp.bright_black()));
            } else {
                output.push_str(&format!("{} ", timestamp));
            }
        }

        let level_str = if config.show_emojis {
            format!("{} {}", level.emoji(), level.as_str())
        } else {
            level.as_str().to_string()
        };
        if config.show_colors {
            output.push_str(&format!("[{}] ", level_str.color(level.color()).bold()));
        } else {
            output.push_str(&format!("[{}] ", level_str));
        }

        if config.show_module {
            if let Some(module) = record.module_path() {
                if config.show_colors {
                    output.push_str(&format!("{}: ", module.bright_blue()));
                } else {
                    output.push_str(&format!("{}: ", module));
                }
            }
        }

        output.push_str(&record.args().to_string());
        output
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => LogLevel::from_level(metadata.level()) >= config.min_level,
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let Ok(config) = self.config.lock() else {
            return;
        };
        let now = Local::now();
        eprintln!("{}", self.format_line(record, now, &config));

        if config.log_file_path.is_some() {
            let plain = LoggerConfig {
                show_colors: false,
                ..config.clone()
            };
            if let Ok(mut guard) = self.log_file.lock() {
                if let Some(file) = guard.as_mut() {
                    let _ = writeln!(file, "{}", self.format_line(record, now, &plain));
                }
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Measures an operation. `stop` logs its completion; a timer that is
/// abandoned or dropped unstopped never reports one.
pub struct Timer {
    start: Instant,
    name: String,
    finished: bool,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
            finished: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Logs completion once. Returns `None` if the timer already finished.
    pub fn stop(&mut self) -> Option<Duration> {
        if self.finished {
            return None;
        }
        self.finished = true;
        let duration = self.elapsed();
        log::info!(
            "⏱️  {} completed in {}ms",
            self.name,
            duration.as_millis()
        );
        Some(duration)
    }

    pub fn abandon(&mut self) {
        if !self.finished {
            self.finished = true;
            log::debug!(
                "⏱️  {} abandoned after {}ms",
                self.name,
                self.elapsed().as_millis()
            );
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.abandon();
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

/// Masks a secret for log output, keeping only a short prefix.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}… ({} chars)", prefix, secret.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert!(LogLevel::Warn > LogLevel::Info);
    }

    #[test]
    fn test_logger_presets() {
        let dev = LoggerConfig::development();
        assert_eq!(dev.min_level, LogLevel::Debug);
        assert!(dev.show_colors);

        let cli = LoggerConfig::cli();
        assert_eq!(cli.min_level, LogLevel::Warn);
        assert!(!cli.include_timestamp);
    }

    #[test]
    fn test_logger_initialization_is_repeatable() {
        assert!(init_with_config(LoggerConfig::development()).is_ok());
        assert!(init_with_config(LoggerConfig::cli()).is_ok());
    }

    #[test]
    fn test_unopenable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("zimage.log");
        let config = LoggerConfig::cli().with_file_output(&path.to_string_lossy());

        let err = init_with_config(config).unwrap_err();
        assert!(err.contains("Failed to open log file"));
        assert!(init_with_config(LoggerConfig::cli()).is_ok());
    }

    #[test]
    fn test_timer_reports_completion_once() {
        let mut timer = Timer::new("exchange");
        assert!(!timer.is_finished());
        assert!(timer.stop().is_some());
        assert!(timer.stop().is_none());
        assert!(timer.is_finished());
    }

    #[test]
    fn test_abandoned_timer_never_completes() {
        let mut timer = Timer::new("exchange");
        timer.abandon();
        assert!(timer.is_finished());
        assert!(timer.stop().is_none());
    }

    #[test]
    fn test_redact_keeps_prefix_only() {
        assert_eq!(redact("sk-abcdef"), "sk-a… (9 chars)");
        assert_eq!(redact("ab"), "ab… (2 chars)");
    }
}
