//! Renderer-agnostic text helpers shared by front-ends.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use directories::BaseDirs;

use crate::video::VideoEntry;

/// `[####------]`, or empty when there is nothing to show.
pub fn render_progress_bar(done: usize, total: usize, width: usize) -> String {
    if width == 0 || total == 0 {
        return String::new();
    }
    let done = done.min(total);
    let filled = (done * width / total).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "--".to_string();
    }
    let total = (d.as_secs_f64() + 0.5) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

pub fn humanize_age(modified: Option<SystemTime>, now: SystemTime) -> String {
    let Some(t) = modified else {
        return "--".to_string();
    };
    let age = now.duration_since(t).unwrap_or(Duration::ZERO);
    let secs = age.as_secs();
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        let epoch = t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        date_lite(epoch)
    }
}

/// `YYYY-MM-DD` (UTC) without pulling in a date crate.
fn date_lite(epoch_secs: u64) -> String {
    let mut y = 1970i64;
    let mut remaining = (epoch_secs / 86400) as i64;
    loop {
        let days_in_year = if is_leap(y) { 366 } else { 365 };
        if remaining < days_in_year {
            break;
        }
        remaining -= days_in_year;
        y += 1;
    }
    let months = [
        31,
        if is_leap(y) { 29 } else { 28 },
        31,
        30,
        31,
        30,
        31,
        31,
        30,
        31,
        30,
        31,
    ];
    let mut mo = 1;
    for &ml in &months {
        if remaining < ml {
            break;
        }
        remaining -= ml;
        mo += 1;
    }
    format!("{:04}-{:02}-{:02}", y, mo, remaining + 1)
}

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

/// Home prefix shown as `~`.
pub fn trim_path(path: &Path) -> String {
    if let Some(dirs) = BaseDirs::new() {
        if let Ok(rest) = path.strip_prefix(dirs.home_dir()) {
            return Path::new("~").join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string_lossy().into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    pub duration: String,
    pub age: String,
    pub tags: String,
}

pub fn video_row(v: &VideoEntry, now: SystemTime) -> Row {
    let duration = match &v.error {
        Some(e) => format!("!{}", e),
        None if v.duration.is_zero() => "(unknown)".to_string(),
        None => format_duration(v.duration),
    };
    Row {
        name: v.name.clone(),
        duration,
        age: humanize_age(v.modified, now),
        tags: v.tags.join(", "),
    }
}
