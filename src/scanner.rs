//! Directory scanner: collect video files under a root, symlink-safe.
//!
//! Results keep the *display path* (the path as browsed, possibly through
//! symlinked directories). Cycle detection keys on the canonical real path,
//! so a directory reached twice is only descended once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::ScanError;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "wmv", "m4v", "webm"];

/// Text after the last `.` of the file name. Dotfiles count: `.mp4` is `mp4`.
pub fn extension_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    name.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn is_video(path: &Path) -> bool {
    extension_of(path)
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sorted, deduplicated list of video paths under `root`.
///
/// A file root yields itself iff it is a video. Any I/O error while reading
/// a directory aborts the walk; no partial list is returned.
pub fn collect_video_paths(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let meta = std::fs::metadata(root).map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Ok(if is_video(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut walk = Walk::default();
    walk.descend(root, root)?;
    debug!(
        "scan done: {} videos, {} dirs visited",
        walk.found.len(),
        walk.visited.len()
    );

    let mut paths = walk.found;
    paths.sort();
    paths.dedup();
    Ok(paths)
}

#[derive(Default)]
struct Walk {
    visited: HashSet<PathBuf>,
    found: Vec<PathBuf>,
}

impl Walk {
    fn descend(&mut self, shown: &Path, real: &Path) -> Result<(), ScanError> {
        let resolved = real.canonicalize().unwrap_or_else(|_| real.to_path_buf());
        if !self.visited.insert(resolved.clone()) {
            debug!("skip revisit {} -> {}", shown.display(), resolved.display());
            return Ok(());
        }

        for entry in WalkDir::new(&resolved)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ScanError::Walk {
                path: resolved.clone(),
                source,
            })?;
            let name = entry.file_name();
            let shown_child = shown.join(name);
            let real_child = resolved.join(name);
            let ft = entry.file_type();

            if ft.is_symlink() {
                self.symlink(shown_child, &real_child)?;
            } else if ft.is_dir() {
                self.descend(&shown_child, &real_child)?;
            } else if is_video(&shown_child) {
                self.found.push(shown_child);
            }
        }
        Ok(())
    }

    fn symlink(&mut self, shown: PathBuf, real: &Path) -> Result<(), ScanError> {
        // Broken links are still surfaced by name; the loader records the
        // stat failure on the entry.
        let target = match real.canonicalize() {
            Ok(t) => t,
            Err(e) => {
                debug!("unresolvable link {}: {}", shown.display(), e);
                self.record_if_video(shown);
                return Ok(());
            }
        };
        let meta = match std::fs::metadata(&target) {
            Ok(m) => m,
            Err(_) => {
                self.record_if_video(shown);
                return Ok(());
            }
        };
        if meta.is_dir() {
            return self.descend(&shown, &target);
        }
        if is_video(&shown) || is_video(&target) {
            self.found.push(shown);
        }
        Ok(())
    }

    fn record_if_video(&mut self, path: PathBuf) {
        if is_video(&path) {
            self.found.push(path);
        }
    }
}
