//! Thumbnail cache and ffmpeg frame extraction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::THUMBNAIL_DIR;
use crate::duration_cache::unix_seconds;
use crate::probe::{ffmpeg_bin, run_with_timeout, which, DurationProber};

const THUMB_WIDTH: u32 = 320;
const THUMB_HEIGHT: u32 = 180;
const THUMB_PERCENT: u32 = 10;
const FF_TIMEOUT: Duration = Duration::from_secs(30);

static FFMPEG_INIT: Once = Once::new();

/// Download ffmpeg via ffmpeg-sidecar if it is not on PATH.
pub fn ensure_ffmpeg() {
    FFMPEG_INIT.call_once(|| {
        if which("ffmpeg") {
            debug!("ffmpeg: using system binary");
            return;
        }
        debug!("ffmpeg: not on PATH, downloading via sidecar...");
        match ffmpeg_sidecar::download::auto_download() {
            Ok(_) => debug!("ffmpeg: sidecar download complete"),
            Err(e) => warn!("ffmpeg download failed: {}", e),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ThumbRecord {
    video_path: String,
    thumbnail: String,
    mod_time_unix: i64,
    created_unix: i64,
}

/// Video path -> generated thumbnail, persisted as a JSON array.
/// Every mutation is written through immediately.
#[derive(Debug)]
pub struct ThumbnailCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, ThumbRecord>>,
}

impl ThumbnailCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ThumbnailCache {
            path: path.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Load from disk; a missing file is an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let cache = Self::new(path);
        let data = match std::fs::read(&cache.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(cache),
            Err(e) => return Err(e).with_context(|| format!("read {}", cache.path.display())),
        };
        let records: Vec<ThumbRecord> =
            serde_json::from_slice(&data).with_context(|| format!("parse {}", cache.path.display()))?;
        {
            let mut entries = cache.lock();
            for r in records {
                entries.insert(r.video_path.clone(), r);
            }
        }
        Ok(cache)
    }

    /// Thumbnail for `video` if recorded for this mtime and still on disk.
    pub fn lookup(&self, video: &Path, modified: SystemTime) -> Option<PathBuf> {
        let entries = self.lock();
        let r = entries.get(&key(video))?;
        if r.mod_time_unix != unix_seconds(modified) {
            return None;
        }
        let thumb = PathBuf::from(&r.thumbnail);
        thumb.exists().then_some(thumb)
    }

    pub fn store(&self, video: &Path, modified: SystemTime, thumbnail: &Path) -> Result<()> {
        let mut entries = self.lock();
        entries.insert(
            key(video),
            ThumbRecord {
                video_path: key(video),
                thumbnail: thumbnail.to_string_lossy().into_owned(),
                mod_time_unix: unix_seconds(modified),
                created_unix: unix_seconds(SystemTime::now()),
            },
        );
        self.write(&entries)
    }

    pub fn remove(&self, video: &Path) -> Result<()> {
        let mut entries = self.lock();
        entries.remove(&key(video));
        self.write(&entries)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self, entries: &BTreeMap<String, ThumbRecord>) -> Result<()> {
        let list: Vec<&ThumbRecord> = entries.values().collect();
        let data = serde_json::to_vec_pretty(&list).context("encode thumbnail cache")?;
        std::fs::write(&self.path, data).with_context(|| format!("write {}", self.path.display()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, ThumbRecord>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn key(video: &Path) -> String {
    video.to_string_lossy().into_owned()
}

/// `<dir>/.thumbnails/<stem>.jpg`
pub fn thumbnail_path(video: &Path) -> PathBuf {
    let dir = video.parent().unwrap_or(Path::new(""));
    let name = video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
    dir.join(THUMBNAIL_DIR).join(format!("{}.jpg", stem))
}

/// Seek point for the extracted frame.
pub fn seek_point(duration: Duration) -> Duration {
    duration * THUMB_PERCENT / 100
}

pub struct ThumbnailGenerator {
    ffmpeg: PathBuf,
    prober: Arc<dyn DurationProber>,
}

impl ThumbnailGenerator {
    pub fn new(prober: Arc<dyn DurationProber>) -> Self {
        ThumbnailGenerator {
            ffmpeg: ffmpeg_bin(),
            prober,
        }
    }

    pub fn with_binary(ffmpeg: impl Into<PathBuf>, prober: Arc<dyn DurationProber>) -> Self {
        ThumbnailGenerator {
            ffmpeg: ffmpeg.into(),
            prober,
        }
    }

    /// Extract one frame. `known` is used as the duration when non-zero,
    /// otherwise the clip is probed first.
    pub fn generate(&self, video: &Path, known: Duration) -> Result<PathBuf> {
        let duration = if known.is_zero() {
            self.prober
                .probe(video)
                .with_context(|| format!("probe video duration {}", video.display()))?
        } else {
            known
        };
        let thumb = thumbnail_path(video);
        if let Some(dir) = thumb.parent() {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let seek = seek_point(duration);
        debug!("thumb {}: seek={:.3}s", video.display(), seek.as_secs_f64());

        let child = Command::new(&self.ffmpeg)
            .arg("-ss")
            .arg(format!("{:.3}", seek.as_secs_f64()))
            .arg("-i")
            .arg(video)
            .args([
                "-vframes",
                "1",
                "-vf",
                &format!("scale={}:{}", THUMB_WIDTH, THUMB_HEIGHT),
                "-y",
            ])
            .arg(&thumb)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("ffmpeg failed to start")?;

        let output = run_with_timeout(child, FF_TIMEOUT).context("extract frame")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg error: {}", stderr.lines().last().unwrap_or("unknown"));
        }
        Ok(thumb)
    }
}
