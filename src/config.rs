//! Runtime options and root-directory resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;

use crate::error::RootError;

pub const DEFAULT_ROOT: &str = "~/Yoga";
pub const DURATION_CACHE_FILE: &str = ".video_duration_cache.json";
pub const THUMBNAIL_CACHE_FILE: &str = ".video_thumbnails.json";
pub const THUMBNAIL_DIR: &str = ".thumbnails";

/// Upper bound on concurrent probe subprocesses regardless of CPU count.
pub const MAX_PROBE_WORKERS: usize = 6;
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);
pub const PROGRESS_TICK: Duration = Duration::from_millis(200);
pub const DEFAULT_PLAYER: &str = "vlc";

#[derive(Debug, Clone)]
pub struct Options {
    pub root: PathBuf,
    pub crop: Option<String>,
    /// Max in-flight probes; the pool also never exceeds the queue length.
    pub worker_cap: usize,
    pub probe_timeout: Duration,
    pub probe_bin: PathBuf,
    pub player: String,
    pub progress_tick: Duration,
}

impl Options {
    pub fn new(root: PathBuf, crop: Option<String>) -> Self {
        let crop = crop
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Options {
            root,
            crop,
            worker_cap: default_worker_cap(),
            probe_timeout: PROBE_TIMEOUT,
            probe_bin: crate::probe::ffprobe_bin(),
            player: DEFAULT_PLAYER.to_string(),
            progress_tick: PROGRESS_TICK,
        }
    }

    /// Sidecar cache lives inside the scanned root; a file root uses its parent.
    pub fn duration_cache_path(&self) -> PathBuf {
        sidecar_dir(&self.root).join(DURATION_CACHE_FILE)
    }

    pub fn thumbnail_cache_path(&self) -> PathBuf {
        sidecar_dir(&self.root).join(THUMBNAIL_CACHE_FILE)
    }
}

fn sidecar_dir(root: &Path) -> &Path {
    if root.is_file() {
        root.parent().unwrap_or(root)
    } else {
        root
    }
}

pub fn default_worker_cap() -> usize {
    let ncpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    ncpus.clamp(1, MAX_PROBE_WORKERS)
}

/// Expand, absolutise and validate the root. An empty input selects
/// `default`, which is created when missing; an explicit root must exist.
pub fn resolve_root(input: &str, default: &str) -> Result<PathBuf, RootError> {
    let trimmed = input.trim();
    let (value, is_default) = if trimmed.is_empty() {
        (default, true)
    } else {
        (trimmed, false)
    };

    let expanded = expand_home(value)?;
    let abs = std::path::absolute(&expanded).map_err(|source| RootError::Resolve {
        path: value.to_string(),
        source,
    })?;

    let meta = match std::fs::metadata(&abs) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !is_default {
                return Err(RootError::Missing(abs));
            }
            std::fs::create_dir_all(&abs).map_err(|source| RootError::Create {
                path: abs.clone(),
                source,
            })?;
            tracing::info!("created default root {}", abs.display());
            std::fs::metadata(&abs).map_err(|source| RootError::Access {
                path: abs.clone(),
                source,
            })?
        }
        Err(source) => return Err(RootError::Access { path: abs, source }),
    };

    if !meta.is_dir() && !meta.is_file() {
        return Err(RootError::NotFileOrDir(abs));
    }
    Ok(abs)
}

fn expand_home(p: &str) -> Result<PathBuf, RootError> {
    let Some(rest) = p.strip_prefix('~') else {
        return Ok(PathBuf::from(p));
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return Err(RootError::UserHome(p.to_string()));
    }
    let home = BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or_else(|| RootError::NoHome(p.to_string()))?;
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}
