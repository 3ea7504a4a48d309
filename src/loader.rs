//! Library loading: scan paths, join cached durations and tag sidecars.
//!
//! Only a traversal failure aborts a load. A file that cannot be stat'ed
//! becomes an entry carrying the error; tag problems are collected into
//! one warning.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::duration_cache::{DurationCache, Fingerprint};
use crate::error::ScanError;
use crate::progress::LoadProgress;
use crate::scanner;
use crate::tags;
use crate::video::{base_name, VideoEntry};

#[derive(Debug, Clone, Default)]
pub struct Library {
    pub videos: Vec<VideoEntry>,
    /// Paths still needing a probe, sorted.
    pub pending: Vec<PathBuf>,
    pub tag_warning: Option<String>,
}

pub fn load_library(
    root: &Path,
    cache: &DurationCache,
    progress: Option<&LoadProgress>,
) -> Result<Library, ScanError> {
    let paths = scanner::collect_video_paths(root)?;
    if let Some(p) = progress {
        p.set_total(paths.len());
    }

    let mut lib = Library {
        videos: Vec::with_capacity(paths.len()),
        ..Default::default()
    };
    let mut tag_errors = Vec::new();

    for path in paths {
        let entry = load_entry(&path, cache, &mut lib.pending, &mut tag_errors);
        lib.videos.push(entry);
        if let Some(p) = progress {
            p.increment();
        }
    }

    lib.pending.sort();
    tag_errors.sort();
    if !tag_errors.is_empty() {
        warn!("tag load: {} failures", tag_errors.len());
        lib.tag_warning = Some(tag_errors.join("; "));
    }
    debug!(
        "loaded {} videos, {} pending duration",
        lib.videos.len(),
        lib.pending.len()
    );
    Ok(lib)
}

fn load_entry(
    path: &Path,
    cache: &DurationCache,
    pending: &mut Vec<PathBuf>,
    tag_errors: &mut Vec<String>,
) -> VideoEntry {
    let mut entry = VideoEntry::new(path.to_path_buf());

    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            debug!("stat {}: {}", path.display(), e);
            let broken = path.symlink_metadata().map(|m| m.is_symlink()).unwrap_or(false);
            entry.error = Some(if broken {
                format!("broken link: {}", e)
            } else {
                e.to_string()
            });
            return entry;
        }
    };

    let fp = Fingerprint::from_metadata(&meta);
    entry.modified = meta.modified().ok();
    entry.size = fp.size;
    match cache.lookup(path, &fp) {
        Some(d) => entry.duration = d,
        None => pending.push(path.to_path_buf()),
    }

    match tags::load(path) {
        Ok(t) => entry.tags = t,
        Err(e) => tag_errors.push(format!("{}: {}", base_name(path), e)),
    }
    entry
}
