//! Bundler execution: process spawning, output streaming, cancellation.
//!
//! PyInstaller writes its log to stderr as `<ms> <LEVEL>: <message>`. Lines
//! are parsed so warnings and errors keep their level in our log, and the
//! `Building <STAGE>` markers become milestones in the parsed log.

use crate::error::BuildError;
use crate::models::BundleSpec;
use crate::system::venv::ActivatedEnvironment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;

static LOG_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+(DEBUG|INFO|WARNING|ERROR|CRITICAL|DEPRECATION):\s?(.*)$")
        .expect("Invalid bundler log regex")
});
static MILESTONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Building (?:PYZ|PKG|EXE|COLLECT|BUNDLE)\b|Build complete!|Analyzing )")
        .expect("Invalid milestone regex")
});

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Severity reported by the bundler for a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlerLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One line of bundler output, parsed where possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlerOutput {
    pub stream: OutputStream,
    /// Raw line as emitted
    pub line: String,
    /// Message with the bundler's timestamp and level stripped
    pub message: String,
    pub level: BundlerLevel,
    pub milestone: bool,
}

impl BundlerOutput {
    pub fn parse(stream: OutputStream, line: String) -> Self {
        let (level, message) = match LOG_LINE_REGEX.captures(&line) {
            Some(caps) => {
                let level = match &caps[2] {
                    "DEBUG" => BundlerLevel::Debug,
                    "WARNING" | "DEPRECATION" => BundlerLevel::Warning,
                    "ERROR" | "CRITICAL" => BundlerLevel::Error,
                    _ => BundlerLevel::Info,
                };
                (level, caps[3].to_string())
            }
            None => (BundlerLevel::Info, line.trim_end().to_string()),
        };

        let milestone = MILESTONE_REGEX.is_match(&message);
        BundlerOutput {
            stream,
            line,
            message,
            level,
            milestone,
        }
    }

    /// Route this line into the `log` facade.
    pub fn log(&self) {
        match self.level {
            BundlerLevel::Error => log::error!("{}", self.message),
            BundlerLevel::Warning => log::warn!("{}", self.message),
            BundlerLevel::Debug => log::debug!("{}", self.message),
            BundlerLevel::Info if self.milestone => log::info!(target: "parsed", "{}", self.message),
            BundlerLevel::Info => log::info!("{}", self.message),
        }
    }
}

/// Run the bundler inside the activated environment.
///
/// Output from both pipes is streamed line by line to `output_callback` as
/// it arrives. A `true` on `cancel_rx` kills the bundler.
///
/// # Returns
/// * `Ok(())` if the bundler exits with status 0
/// * `Err(BuildError::BundlerSpawn)` if the process cannot be started
/// * `Err(BuildError::BundlerFailed)` with the bundler's exit code otherwise
/// * `Err(BuildError::BundleCancelled)` if cancelled
pub async fn run_bundler<F>(
    spec: &BundleSpec,
    project_root: &Path,
    env: &ActivatedEnvironment,
    mut output_callback: F,
    mut cancel_rx: watch::Receiver<bool>,
) -> Result<(), BuildError>
where
    F: FnMut(BundlerOutput),
{
    if *cancel_rx.borrow() {
        return Err(BuildError::BundleCancelled);
    }

    let mut command = Command::new(&spec.program);
    command
        .args(spec.args())
        .current_dir(project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    env.apply(&mut command);

    log::info!(
        "Running {} {}",
        spec.program.display(),
        spec.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut child = command.spawn().map_err(|source| BuildError::BundlerSpawn {
        program: spec.program.display().to_string(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| BuildError::BundlerSpawn {
            program: spec.program.display().to_string(),
            source: std::io::Error::other("stdout was not captured"),
        })?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| BuildError::BundlerSpawn {
            program: spec.program.display().to_string(),
            source: std::io::Error::other("stderr was not captured"),
        })?;

    // Raw segments, not `lines()`: a non-UTF-8 path in the bundler's log
    // must not stop us draining the pipe
    let mut stdout_lines = BufReader::new(stdout).split(b'\n');
    let mut stderr_lines = BufReader::new(stderr).split(b'\n');

    let mut stdout_closed = false;
    let mut stderr_closed = false;
    // A dropped sender means nobody can cancel any more
    let mut cancel_open = true;

    while !(stdout_closed && stderr_closed) {
        tokio::select! {
            segment = stdout_lines.next_segment(), if !stdout_closed => {
                match segment {
                    Ok(Some(bytes)) => output_callback(BundlerOutput::parse(OutputStream::Stdout, decode_line(&bytes))),
                    Ok(None) => stdout_closed = true,
                    Err(e) => {
                        log::warn!("stdout read error: {}", e);
                        stdout_closed = true;
                    }
                }
            }
            segment = stderr_lines.next_segment(), if !stderr_closed => {
                match segment {
                    Ok(Some(bytes)) => output_callback(BundlerOutput::parse(OutputStream::Stderr, decode_line(&bytes))),
                    Ok(None) => stderr_closed = true,
                    Err(e) => {
                        log::warn!("stderr read error: {}", e);
                        stderr_closed = true;
                    }
                }
            }
            changed = cancel_rx.changed(), if cancel_open => {
                match changed {
                    Ok(()) if *cancel_rx.borrow() => {
                        log::warn!("Cancellation requested, stopping bundler");
                        terminate(&mut child).await;
                        return Err(BuildError::BundleCancelled);
                    }
                    Ok(()) => {}
                    Err(_) => cancel_open = false,
                }
            }
        }
    }

    // Pipes closed, the bundler may still be running
    drop(stdout_lines);
    drop(stderr_lines);
    let status = loop {
        tokio::select! {
            status = child.wait() => {
                break status.map_err(|source| BuildError::BundlerSpawn {
                    program: spec.program.display().to_string(),
                    source,
                })?;
            }
            changed = cancel_rx.changed(), if cancel_open => {
                match changed {
                    Ok(()) if *cancel_rx.borrow() => {
                        log::warn!("Cancellation requested, stopping bundler");
                        terminate(&mut child).await;
                        return Err(BuildError::BundleCancelled);
                    }
                    Ok(()) => {}
                    Err(_) => cancel_open = false,
                }
            }
        }
    };

    if status.success() {
        log::info!("Bundler finished successfully");
        Ok(())
    } else {
        Err(BuildError::BundlerFailed {
            code: status.code(),
        })
    }
}

/// Decode one output segment, tolerating invalid UTF-8 and CRLF endings.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Kill the bundler and everything it spawned.
async fn terminate(child: &mut tokio::process::Child) {
    // Children first, while the parent pid is still valid
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            match std::process::Command::new("pkill")
                .arg("-9")
                .arg("-P")
                .arg(pid.to_string())
                .output()
            {
                // 1 means no child matched
                Ok(out) if out.status.code().map_or(true, |code| code > 1) => {
                    log::warn!(
                        "pkill -P {} failed: {}",
                        pid,
                        String::from_utf8_lossy(&out.stderr).trim()
                    );
                }
                Ok(_) => {}
                Err(e) => log::warn!("Failed to run pkill for bundler children: {}", e),
            }
        }
    }

    if let Err(e) = child.kill().await {
        log::warn!("Failed to kill bundler process: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info_line() {
        let out = BundlerOutput::parse(
            OutputStream::Stderr,
            "1520 INFO: Building COLLECT COLLECT-00.toc".to_string(),
        );
        assert_eq!(out.level, BundlerLevel::Info);
        assert_eq!(out.message, "Building COLLECT COLLECT-00.toc");
        assert!(out.milestone);
    }

    #[test]
    fn test_parse_warning_and_error() {
        let warn = BundlerOutput::parse(
            OutputStream::Stderr,
            "88 WARNING: lib not found: libGL.so.1".to_string(),
        );
        assert_eq!(warn.level, BundlerLevel::Warning);
        assert!(!warn.milestone);

        let err = BundlerOutput::parse(
            OutputStream::Stderr,
            "12 ERROR: Script file 'app.py' does not exist.".to_string(),
        );
        assert_eq!(err.level, BundlerLevel::Error);
        assert_eq!(err.message, "Script file 'app.py' does not exist.");
    }

    #[test]
    fn test_parse_build_complete() {
        let out = BundlerOutput::parse(
            OutputStream::Stderr,
            "40211 INFO: Build complete! The results are available in: /src/dist".to_string(),
        );
        assert!(out.milestone);
    }

    #[test]
    fn test_parse_unstructured_line() {
        let out = BundlerOutput::parse(OutputStream::Stdout, "plain output  ".to_string());
        assert_eq!(out.level, BundlerLevel::Info);
        assert_eq!(out.message, "plain output");
        assert_eq!(out.line, "plain output  ");
        assert!(!out.milestone);
    }

    #[test]
    fn test_decode_line_is_lossy() {
        assert_eq!(decode_line(b"10 INFO: Collecting /music/caf\xe9"), "10 INFO: Collecting /music/caf\u{fffd}");
        assert_eq!(decode_line(b"plain\r"), "plain");
    }

    #[test]
    fn test_building_because_is_not_a_milestone() {
        let out = BundlerOutput::parse(
            OutputStream::Stderr,
            "300 INFO: Building because toc changed".to_string(),
        );
        assert!(!out.milestone);
    }
}
