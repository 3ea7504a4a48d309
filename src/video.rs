use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// One library item. Identity is `path` (the display path).
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEntry {
    pub name: String,
    pub path: PathBuf,
    /// Zero means unknown.
    pub duration: Duration,
    pub modified: Option<SystemTime>,
    pub size: u64,
    pub tags: Vec<String>,
    pub error: Option<String>,
}

impl VideoEntry {
    pub fn new(path: PathBuf) -> Self {
        VideoEntry {
            name: base_name(&path),
            path,
            duration: Duration::ZERO,
            modified: None,
            size: 0,
            tags: Vec::new(),
            error: None,
        }
    }

    /// Duration rounded to the nearest whole minute.
    pub fn minutes(&self) -> u64 {
        (self.duration.as_secs_f64() / 60.0).round() as u64
    }
}

pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
