//! Decoupled logging pipeline for packaging runs.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / bundler output
//!     |
//! [LogCollector] (console echo in the caller, never blocks on disk)
//!     | (crossbeam unbounded channel)
//!     v
//! [DiskPersister thread]
//!     |
//! logs/full/<ts>_full.log      every line
//! logs/parsed/<ts>_parsed.log  milestones only (target "parsed")
//! ```
//!
//! Disk writes happen on a dedicated OS thread, so they work the same from
//! inside or outside a tokio runtime. `wait_for_empty` pushes a flush marker
//! through the channel and resolves once everything before it is on disk.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log routing category
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    /// Detailed output, persisted to the full log only
    Full,
    /// High-level milestone, persisted to both logs
    Parsed,
}

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker; the sender is signalled once every earlier line is written
    Flush(tokio::sync::oneshot::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub kind: LogKind,
    /// Wall-clock time the line was produced (`HH:MM:SS.mmm`)
    pub timestamp: String,
}

impl LogLine {
    pub fn new(message: String) -> Self {
        LogLine {
            message,
            kind: LogKind::Full,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(message: String) -> Self {
        LogLine {
            kind: LogKind::Parsed,
            ..LogLine::new(message)
        }
    }

    /// Render as it appears on disk: `[HH:MM:SS.mmm] message`
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp, self.message)
    }
}

/// Unified logger that persists to disk and echoes to the console
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    full_log: PathBuf,
    parsed_log: PathBuf,
    echo: bool,
    level: LevelFilter,
}

impl LogCollector {
    /// Create the log directories and session files, then start the persister thread.
    pub fn new(log_dir: &Path, echo: bool) -> Result<Self, String> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)
            .map_err(|e| format!("Failed to create full log dir: {}", e))?;
        std::fs::create_dir_all(&parsed_log_dir)
            .map_err(|e| format!("Failed to create parsed log dir: {}", e))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let full_log = full_log_dir.join(format!("{}_full.log", stamp));
        let parsed_log = parsed_log_dir.join(format!("{}_parsed.log", stamp));

        let mut full_file = open_append(&full_log)?;
        let mut parsed_file = open_append(&parsed_log)?;

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::Builder::new()
            .name("log-persister".to_string())
            .spawn(move || {
                while let Ok(msg) = rx.recv() {
                    match msg {
                        LogMessage::Line(line) => {
                            if let Err(e) = persist_log_line(&line, &mut full_file, &mut parsed_file) {
                                eprintln!("[Log] Failed to persist log line: {}", e);
                            }
                        }
                        LogMessage::Flush(done) => {
                            let _ = full_file.flush();
                            let _ = parsed_file.flush();
                            let _ = done.send(());
                        }
                    }
                }
            })
            .map_err(|e| format!("Failed to spawn log persister thread: {}", e))?;

        Ok(LogCollector {
            tx,
            full_log,
            parsed_log,
            echo,
            level: LevelFilter::Info,
        })
    }

    /// Minimum level accepted through the `log` facade
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn full_log_path(&self) -> &Path {
        &self.full_log
    }

    pub fn parsed_log_path(&self) -> &Path {
        &self.parsed_log
    }

    /// Send a log line (non-blocking). Cannot fail: the channel is unbounded.
    pub fn log_line(&self, line: LogLine) {
        if self.echo {
            eprintln!("{}", line.message);
        }
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Send a detailed log line
    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(message.into()));
    }

    /// Send a milestone log line
    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log_line(LogLine::parsed(message.into()));
    }

    /// Wait for all pending logs to be written to disk.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(LogMessage::Flush(done_tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        done_rx
            .await
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }

    /// Install a clone of this collector as the global `log` backend.
    pub fn install(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.level);
        Ok(())
    }
}

/// Wires all log::info!(), log::warn!(), log::error!() calls into LogCollector
impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = match record.level() {
            Level::Info => record.args().to_string(),
            level => format!("[{}] {}", level, record.args()),
        };

        // Target-aware routing: "parsed" marks milestones
        if record.target() == "parsed" {
            self.log_parsed(message);
        } else {
            self.log_str(message);
        }
    }

    fn flush(&self) {}
}

fn open_append(path: &Path) -> Result<File, String> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))
}

/// Persist a single log line to the session files
fn persist_log_line(line: &LogLine, full: &mut File, parsed: &mut File) -> std::io::Result<()> {
    let rendered = line.render();
    writeln!(full, "{}", rendered)?;
    if line.kind == LogKind::Parsed {
        writeln!(parsed, "{}", rendered)?;
    }
    Ok(())
}
