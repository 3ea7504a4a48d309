//! Persistent duration cache keyed by absolute path, validated by
//! (mtime, size) fingerprint.
//!
//! Writes only mark the cache dirty; nothing touches disk until `flush`.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CacheError;

/// Cheap "file unchanged" proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub mtime_unix: i64,
    pub size: u64,
}

impl Fingerprint {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Fingerprint {
            mtime_unix: meta.modified().map(unix_seconds).unwrap_or(0),
            size: meta.len(),
        }
    }
}

pub fn unix_seconds(t: std::time::SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs_f64().ceil() as i64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct CacheRecord {
    duration_seconds: f64,
    mod_time_unix: i64,
    size: u64,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<String, CacheRecord>,
    dirty: bool,
}

#[derive(Debug)]
pub struct DurationCache {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl DurationCache {
    /// Empty cache that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DurationCache {
            path: path.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Open the cache file. A missing or empty file is a fresh cache.
    /// Unreadable or malformed content still yields a usable empty cache,
    /// alongside the error for the caller to report.
    pub fn open(path: impl Into<PathBuf>) -> (Self, Option<CacheError>) {
        let cache = Self::new(path);
        let data = match std::fs::read(&cache.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (cache, None),
            Err(source) => {
                let err = CacheError::Read {
                    path: cache.path.clone(),
                    source,
                };
                return (cache, Some(err));
            }
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return (cache, None);
        }
        match serde_json::from_slice::<BTreeMap<String, CacheRecord>>(&data) {
            Ok(records) => {
                debug!("duration cache: {} records from {}", records.len(), cache.path.display());
                cache.lock().records = records;
                (cache, None)
            }
            Err(source) => {
                let err = CacheError::Parse {
                    path: cache.path.clone(),
                    source,
                };
                (cache, Some(err))
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached duration if the record still matches the live file.
    /// A stale record is dropped on the way out.
    pub fn lookup(&self, path: &Path, fp: &Fingerprint) -> Option<Duration> {
        let key = path.to_string_lossy();
        let mut inner = self.lock();
        let rec = *inner.records.get(key.as_ref())?;
        if rec.mod_time_unix != fp.mtime_unix || rec.size != fp.size {
            inner.records.remove(key.as_ref());
            inner.dirty = true;
            return None;
        }
        if rec.duration_seconds <= 0.0 || !rec.duration_seconds.is_finite() {
            return None;
        }
        Some(Duration::from_secs_f64(rec.duration_seconds))
    }

    /// Upsert a record. Zero durations are ignored.
    pub fn record(&self, path: &Path, fp: &Fingerprint, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let rec = CacheRecord {
            duration_seconds: duration.as_secs_f64(),
            mod_time_unix: fp.mtime_unix,
            size: fp.size,
        };
        let mut inner = self.lock();
        inner.records.insert(path.to_string_lossy().into_owned(), rec);
        inner.dirty = true;
    }

    /// Persist as indented JSON if anything changed since the last flush.
    /// Returns whether a write happened.
    pub fn flush(&self) -> Result<bool, CacheError> {
        let snapshot = {
            let mut inner = self.lock();
            if !inner.dirty {
                return Ok(false);
            }
            inner.dirty = false;
            inner.records.clone()
        };

        let result = serde_json::to_vec_pretty(&snapshot)
            .map_err(CacheError::from)
            .and_then(|data| {
                std::fs::write(&self.path, data).map_err(|source| CacheError::Write {
                    path: self.path.clone(),
                    source,
                })
            });
        match result {
            Ok(()) => {
                debug!("duration cache: flushed {} records", snapshot.len());
                Ok(true)
            }
            Err(e) => {
                // Keep the changes pending so a later flush retries.
                self.lock().dirty = true;
                Err(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic mid-update of a plain map.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(mtime: i64, size: u64) -> Fingerprint {
        Fingerprint {
            mtime_unix: mtime,
            size,
        }
    }

    #[test]
    fn record_then_lookup() {
        let cache = DurationCache::new("/unused.json");
        let p = Path::new("/videos/a.mp4");
        cache.record(p, &fp(100, 5), Duration::from_secs(90));
        assert_eq!(cache.lookup(p, &fp(100, 5)), Some(Duration::from_secs(90)));
    }

    #[test]
    fn changed_fingerprint_invalidates() {
        let cache = DurationCache::new("/unused.json");
        let p = Path::new("/videos/a.mp4");
        cache.record(p, &fp(100, 5), Duration::from_secs(90));
        assert_eq!(cache.lookup(p, &fp(100, 6)), None);
        // The stale record is gone even for the original fingerprint.
        assert_eq!(cache.lookup(p, &fp(100, 5)), None);
        assert!(cache.is_empty());

        cache.record(p, &fp(100, 5), Duration::from_secs(90));
        assert_eq!(cache.lookup(p, &fp(101, 5)), None);
    }

    #[test]
    fn zero_duration_not_recorded() {
        let cache = DurationCache::new("/unused.json");
        let p = Path::new("/videos/a.mp4");
        cache.record(p, &fp(1, 1), Duration::ZERO);
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(p, &fp(1, 1)), None);
    }

    #[test]
    fn non_positive_on_disk_never_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"/v/a.mp4":{"duration_seconds":0,"mod_time_unix":1,"size":2},
                "/v/b.mp4":{"duration_seconds":-3.5,"mod_time_unix":1,"size":2}}"#,
        )
        .unwrap();
        let (cache, err) = DurationCache::open(&path);
        assert!(err.is_none());
        assert_eq!(cache.lookup(Path::new("/v/a.mp4"), &fp(1, 2)), None);
        assert_eq!(cache.lookup(Path::new("/v/b.mp4"), &fp(1, 2)), None);
    }

    // ── open ────────────────────────────────────────────────────────────

    #[test]
    fn missing_file_is_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, err) = DurationCache::open(dir.path().join("none.json"));
        assert!(err.is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_file_reports_error_but_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"{not json").unwrap();
        let (cache, err) = DurationCache::open(&path);
        assert!(matches!(err, Some(CacheError::Parse { .. })));
        let p = Path::new("/v/a.mp4");
        cache.record(p, &fp(1, 1), Duration::from_secs(3));
        assert_eq!(cache.lookup(p, &fp(1, 1)), Some(Duration::from_secs(3)));
    }

    // ── flush ───────────────────────────────────────────────────────────

    #[test]
    fn flush_without_writes_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = DurationCache::new(&path);
        assert!(!cache.flush().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn second_flush_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = DurationCache::new(&path);
        cache.record(Path::new("/v/a.mp4"), &fp(1, 1), Duration::from_secs(3));
        assert!(cache.flush().unwrap());
        assert!(!cache.flush().unwrap());
    }

    #[test]
    fn flush_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = DurationCache::new(&path);
        let p = Path::new("/v/a.mp4");
        cache.record(p, &fp(1700000000, 42), Duration::from_millis(61500));
        cache.flush().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"/v/a.mp4\""), "indented JSON: {}", raw);
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["/v/a.mp4"]["duration_seconds"], 61.5);
        assert_eq!(json["/v/a.mp4"]["mod_time_unix"], 1700000000);
        assert_eq!(json["/v/a.mp4"]["size"], 42);

        let (reopened, err) = DurationCache::open(&path);
        assert!(err.is_none());
        assert_eq!(
            reopened.lookup(p, &fp(1700000000, 42)),
            Some(Duration::from_millis(61500))
        );
    }

    #[test]
    fn invalidation_marks_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = DurationCache::new(&path);
        let p = Path::new("/v/a.mp4");
        cache.record(p, &fp(1, 1), Duration::from_secs(3));
        cache.flush().unwrap();
        assert_eq!(cache.lookup(p, &fp(2, 1)), None);
        assert!(cache.flush().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn write_failure_keeps_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DurationCache::new(dir.path().join("missing-dir/cache.json"));
        cache.record(Path::new("/v/a.mp4"), &fp(1, 1), Duration::from_secs(3));
        assert!(matches!(cache.flush(), Err(CacheError::Write { .. })));
        assert!(matches!(cache.flush(), Err(CacheError::Write { .. })));
    }

    #[test]
    fn concurrent_record_and_lookup() {
        use std::sync::Arc;
        let cache = Arc::new(DurationCache::new("/unused.json"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let p = PathBuf::from(format!("/v/{}.mp4", i));
                    cache.record(&p, &fp(i, 1), Duration::from_secs(i as u64 + 1));
                    cache.lookup(&p, &fp(i, 1))
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), Some(Duration::from_secs(i as u64 + 1)));
        }
        assert_eq!(cache.len(), 8);
    }
}
