//! Per-video tag sidecar files: a JSON array of strings next to the video.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::TagError;

/// `clip.mp4` -> `clip.json`; any other extension gets `.json` appended.
pub fn path_for(video: &Path) -> PathBuf {
    let name = video.file_name().and_then(|n| n.to_str()).unwrap_or("");
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("mp4") => {
            video.with_file_name(format!("{}.json", stem))
        }
        _ => {
            let mut s = video.as_os_str().to_owned();
            s.push(".json");
            PathBuf::from(s)
        }
    }
}

/// Tags for a video. A missing sidecar is an empty list.
pub fn load(video: &Path) -> Result<Vec<String>, TagError> {
    let path = path_for(video);
    let data = match std::fs::read(&path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(TagError::Io { path, source }),
    };
    let parsed: Vec<String> =
        serde_json::from_slice(&data).map_err(|source| TagError::Json {
            path: path.clone(),
            source,
        })?;
    Ok(sanitize(parsed))
}

pub fn save(video: &Path, tags: &[String]) -> Result<(), TagError> {
    let path = path_for(video);
    let cleaned = sanitize(tags.iter().cloned());
    let payload = serde_json::to_vec_pretty(&cleaned).map_err(|source| TagError::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, payload).map_err(|source| TagError::Io { path, source })
}

/// Trim, drop empties, dedupe (case-sensitive), sort.
pub fn sanitize(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut cleaned: Vec<String> = raw
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned
}

/// Parse comma-separated editor input. Case-insensitive dedupe keeps the
/// first spelling; input order is preserved.
pub fn parse_tag_input(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}
