//! Typed errors for each layer of the library pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Directory traversal failure. Fatal to the whole scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read directory {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("read cache {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse cache {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode cache: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("write cache {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),
    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("empty duration")]
    Empty,
    #[error("invalid duration {0:?}")]
    Parse(String),
}

/// Rejected filter input. The previous filters stay in effect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid min minutes: {0:?}")]
    InvalidMin(String),
    #[error("invalid max minutes: {0:?}")]
    InvalidMax(String),
    #[error("min minutes must be positive")]
    NegativeMin,
    #[error("max minutes must be positive")]
    NegativeMax,
    #[error("min minutes cannot exceed max minutes")]
    MinExceedsMax,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum RootError {
    #[error("cannot expand root path {0:?}: no home directory")]
    NoHome(String),
    #[error("cannot expand root path {0:?}: ~user paths are not supported")]
    UserHome(String),
    #[error("cannot resolve root path {path:?}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("root path does not exist: {}", .0.display())]
    Missing(PathBuf),
    #[error("cannot access root path {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot create default directory {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("root path {} is not a file or directory", .0.display())]
    NotFileOrDir(PathBuf),
}
