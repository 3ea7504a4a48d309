//! Duration probing via an external `ffprobe`, bounded by a timeout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::ProbeError;

/// Stateless duration lookup for a single clip. Failures are per item;
/// nothing retries.
pub trait DurationProber: Send + Sync {
    fn probe(&self, path: &Path) -> Result<Duration, ProbeError>;
}

#[derive(Debug, Clone)]
pub struct Ffprobe {
    bin: PathBuf,
    timeout: Duration,
}

impl Ffprobe {
    pub fn with_binary(bin: impl Into<PathBuf>, timeout: Duration) -> Self {
        Ffprobe {
            bin: bin.into(),
            timeout,
        }
    }
}

impl DurationProber for Ffprobe {
    fn probe(&self, path: &Path) -> Result<Duration, ProbeError> {
        let child = Command::new(&self.bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ProbeError::Spawn)?;

        let output = run_with_timeout(child, self.timeout)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: stderr.lines().last().unwrap_or("unknown").trim().to_string(),
            });
        }
        let dur = parse_seconds(&String::from_utf8_lossy(&output.stdout))?;
        debug!("probe {}: {:.1}s", path.display(), dur.as_secs_f64());
        Ok(dur)
    }
}

/// Parse a single decimal seconds value.
pub fn parse_seconds(raw: &str) -> Result<Duration, ProbeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProbeError::Empty);
    }
    let secs: f64 = raw.parse().map_err(|_| ProbeError::Parse(raw.to_string()))?;
    Duration::try_from_secs_f64(secs).map_err(|_| ProbeError::Parse(raw.to_string()))
}

/// Wait for `child`, killing it past `timeout`. Pipes are drained on
/// reader threads while waiting so a chatty child never blocks on write.
pub(crate) fn run_with_timeout(mut child: Child, timeout: Duration) -> Result<Output, ProbeError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            child.kill().ok();
            child.wait().ok();
            return Err(ProbeError::Timeout(timeout));
        }
        Err(e) => {
            child.kill().ok();
            child.wait().ok();
            return Err(ProbeError::Wait(e));
        }
    };
    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut p| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            p.read_to_end(&mut buf).ok();
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// System ffprobe first, then the ffmpeg-sidecar download dir.
pub fn ffprobe_bin() -> PathBuf {
    sidecar_or_system("ffprobe")
}

pub fn ffmpeg_bin() -> PathBuf {
    sidecar_or_system("ffmpeg")
}

fn sidecar_or_system(name: &str) -> PathBuf {
    if which(name) {
        return PathBuf::from(name);
    }
    if let Ok(dir) = ffmpeg_sidecar::paths::sidecar_dir() {
        let bin = if cfg!(windows) {
            dir.join(format!("{}.exe", name))
        } else {
            dir.join(name)
        };
        if bin.exists() {
            return bin;
        }
    }
    PathBuf::from(name)
}

pub(crate) fn which(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
