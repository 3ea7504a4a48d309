//! View model: the single-threaded state machine front-ends drive.
//!
//! `Model::update` takes one event and returns the side effects to run.
//! It never performs I/O itself; the runtime executes the effects and feeds
//! their results back as events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::duration_cache::DurationCache;
use crate::filters::{apply_filters_and_sort, FilterInputs, FilterState, SortField, SortOrder};
use crate::jobs::{Completion, DurationQueue};
use crate::loader::Library;
use crate::progress::ProgressSnapshot;
use crate::tags;
use crate::video::{base_name, VideoEntry};
use crate::view::render_progress_bar;

const PROGRESS_BAR_WIDTH: usize = 24;

/// Result of a background library scan.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub library: Result<Library, String>,
    pub cache_warning: Option<String>,
    pub cache: Arc<DurationCache>,
}

#[derive(Debug, Clone)]
pub enum Event {
    // ── background results ──
    VideosLoaded(Box<Loaded>),
    /// Load progress, tagged with the scan that scheduled the tick.
    ProgressTick {
        scan: u64,
        snapshot: ProgressSnapshot,
    },
    DurationResolved {
        path: PathBuf,
        result: Result<Duration, String>,
    },
    CacheFlushed(Result<bool, String>),
    TagsSaved {
        path: PathBuf,
        result: Result<Vec<String>, String>,
    },
    PlayerStarted {
        path: PathBuf,
        result: Result<(), String>,
    },
    // ── user commands ──
    ApplyFilters(FilterInputs),
    ResetFilters,
    Sort(SortField),
    MoveCursor(isize),
    Select(PathBuf),
    Play,
    ToggleCrop,
    /// Comma-separated tag editor input for the selected video.
    SaveTags(String),
    Reindex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Scan,
    TickProgress(u64),
    Probe(PathBuf),
    FlushCache,
    SaveTags { path: PathBuf, tags: Vec<String> },
    Play { path: PathBuf, crop: Option<String> },
}

#[derive(Debug)]
pub struct Model {
    videos: Vec<VideoEntry>,
    filtered: Vec<VideoEntry>,
    filters: FilterState,
    sort: SortOrder,
    cursor: usize,
    loading: bool,
    /// Bumped per scan so ticks from an earlier scan stop re-arming.
    scan: u64,
    load_error: Option<String>,
    status: String,
    base_status: String,
    durations: DurationQueue,
    worker_cap: usize,
    crop: Option<String>,
    crop_enabled: bool,
}

impl Model {
    pub fn new(worker_cap: usize, crop: Option<String>) -> Self {
        let crop_enabled = crop.is_some();
        Model {
            videos: Vec::new(),
            filtered: Vec::new(),
            filters: FilterState::default(),
            sort: SortOrder::default(),
            cursor: 0,
            loading: true,
            scan: 1,
            load_error: None,
            status: "Scanning for videos...".to_string(),
            base_status: String::new(),
            durations: DurationQueue::new(),
            worker_cap,
            crop,
            crop_enabled,
        }
    }

    /// Effects to kick off the first scan.
    pub fn init(&self) -> Vec<Effect> {
        vec![Effect::Scan, Effect::TickProgress(self.scan)]
    }

    pub fn update(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::VideosLoaded(loaded) => self.on_loaded(*loaded),
            Event::ProgressTick { scan, snapshot } => self.on_progress(scan, snapshot),
            Event::DurationResolved { path, result } => self.on_duration(path, result),
            Event::CacheFlushed(result) => {
                self.on_flushed(result);
                Vec::new()
            }
            Event::TagsSaved { path, result } => {
                self.on_tags_saved(path, result);
                Vec::new()
            }
            Event::PlayerStarted { path, result } => {
                self.status = match result {
                    Ok(()) => format!("Playing: {}", crate::view::trim_path(&path)),
                    Err(e) => format!("Failed to launch player: {}", e),
                };
                Vec::new()
            }
            Event::ApplyFilters(inputs) => {
                self.apply_filter_inputs(&inputs);
                Vec::new()
            }
            Event::ResetFilters => {
                self.filters = FilterState::default();
                self.refilter();
                self.status = format!("Filters cleared ({} videos)", self.filtered.len());
                Vec::new()
            }
            Event::Sort(field) => {
                self.sort.toggle(field);
                self.refilter();
                self.status = format!("Sorted {} videos", self.filtered.len());
                Vec::new()
            }
            Event::MoveCursor(delta) => {
                self.move_cursor(delta);
                Vec::new()
            }
            Event::Select(path) => {
                self.restore_selection(Some(path));
                Vec::new()
            }
            Event::Play => self.play_selection(),
            Event::ToggleCrop => {
                self.toggle_crop();
                Vec::new()
            }
            Event::SaveTags(input) => self.commit_tags(&input),
            Event::Reindex => {
                if self.loading {
                    return Vec::new();
                }
                self.loading = true;
                self.scan += 1;
                self.status = "Re-indexing videos...".to_string();
                vec![Effect::Scan, Effect::TickProgress(self.scan)]
            }
        }
    }

    // ── loading ─────────────────────────────────────────────────────────

    fn on_loaded(&mut self, loaded: Loaded) -> Vec<Effect> {
        self.loading = false;
        let library = match loaded.library {
            Ok(lib) => lib,
            Err(e) => {
                warn!("load failed: {}", e);
                self.status = format!("error: {}", e);
                self.load_error = Some(e);
                return Vec::new();
            }
        };
        self.load_error = None;
        self.merge_videos(library.videos);

        let selected = self.selected_path();
        self.refilter();
        self.restore_selection(selected);
        self.status_after_load(
            library.pending.len(),
            loaded.cache_warning.as_deref(),
            library.tag_warning.as_deref(),
        );

        let dispatch = self.durations.enqueue(library.pending, self.worker_cap);
        debug!(
            "duration pool: {} dispatched, {} queued",
            dispatch.len(),
            self.durations.queued()
        );
        dispatch.into_iter().map(Effect::Probe).collect()
    }

    /// First load takes the list wholesale; later loads replace entries by
    /// path and append new ones.
    fn merge_videos(&mut self, incoming: Vec<VideoEntry>) {
        if self.videos.is_empty() {
            self.videos = incoming;
            return;
        }
        let index: HashMap<PathBuf, usize> = self
            .videos
            .iter()
            .enumerate()
            .map(|(i, v)| (v.path.clone(), i))
            .collect();
        for v in incoming {
            match index.get(&v.path) {
                Some(&i) => {
                    // Keep a duration resolved since the scan read the cache.
                    let known = self.videos[i].duration;
                    self.videos[i] = v;
                    if self.videos[i].duration.is_zero() && self.videos[i].error.is_none() {
                        self.videos[i].duration = known;
                    }
                }
                None => self.videos.push(v),
            }
        }
    }

    fn status_after_load(&mut self, pending: usize, cache_warning: Option<&str>, tag_warning: Option<&str>) {
        if self.filtered.is_empty() {
            self.base_status = "No videos found".to_string();
            self.status = self.base_status.clone();
            return;
        }
        let mut status = format!("Loaded {} videos", self.filtered.len());
        if let Some(w) = cache_warning {
            status.push_str(&format!(" (cache warning: {})", w));
        }
        if pending > 0 {
            status.push_str(", probing durations...");
        }
        if let Some(w) = tag_warning {
            status.push_str(&format!(" (tag warning: {})", w));
        }
        self.base_status = status.clone();
        self.status = status;
    }

    fn on_progress(&mut self, scan: u64, snap: ProgressSnapshot) -> Vec<Effect> {
        if !self.loading || scan != self.scan {
            return Vec::new();
        }
        if snap.done {
            self.status = if snap.total == 0 {
                "No videos found".to_string()
            } else {
                format!("Loaded {} videos", snap.total)
            };
            return Vec::new();
        }
        self.status = format!("Loading videos {}/{}...", snap.processed, snap.total);
        vec![Effect::TickProgress(self.scan)]
    }

    // ── durations ───────────────────────────────────────────────────────

    fn on_duration(&mut self, path: PathBuf, result: Result<Duration, String>) -> Vec<Effect> {
        match self.durations.complete(&path) {
            Completion::Unknown => {
                debug!("stale duration result for {}", path.display());
                Vec::new()
            }
            c => {
                let selected = self.selected_path();
                self.set_duration(&path, &result);
                self.refilter();
                self.restore_selection(selected);
                self.status = match &result {
                    Err(e) => format!("Duration error for {}: {}", base_name(&path), e),
                    Ok(_) => format!(
                        "Probing durations {}/{}...",
                        self.durations.done(),
                        self.durations.total()
                    ),
                };
                if c == Completion::Finished {
                    self.status = format!("Durations ready ({} videos)", self.filtered.len());
                    return vec![Effect::FlushCache];
                }
                self.durations.next().map(Effect::Probe).into_iter().collect()
            }
        }
    }

    fn set_duration(&mut self, path: &Path, result: &Result<Duration, String>) {
        if let Some(v) = self.videos.iter_mut().find(|v| v.path == path) {
            match result {
                Ok(d) => {
                    v.duration = *d;
                    v.error = None;
                }
                Err(e) => {
                    v.duration = Duration::ZERO;
                    v.error = Some(e.clone());
                }
            }
        }
    }

    fn on_flushed(&mut self, result: Result<bool, String>) {
        if let Err(e) = result {
            warn!("duration cache flush: {}", e);
            self.status = format!("Duration cache flush error: {}", e);
        }
    }

    // ── filters / selection ─────────────────────────────────────────────

    fn apply_filter_inputs(&mut self, inputs: &FilterInputs) {
        match FilterState::from_inputs(inputs) {
            Ok(f) => {
                self.filters = f;
                self.refilter();
                self.status = format!("Filters applied ({} videos)", self.filtered.len());
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    /// Recompute the visible list; the cursor returns to the top.
    fn refilter(&mut self) {
        self.filtered = apply_filters_and_sort(&self.videos, &self.filters, self.sort);
        self.cursor = 0;
    }

    fn restore_selection(&mut self, path: Option<PathBuf>) {
        let Some(path) = path else { return };
        if let Some(i) = self.filtered.iter().position(|v| v.path == path) {
            self.cursor = i;
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    // ── actions ─────────────────────────────────────────────────────────

    fn play_selection(&mut self) -> Vec<Effect> {
        let Some(v) = self.selected() else {
            return Vec::new();
        };
        let path = v.path.clone();
        self.status = format!("Launching player: {}", v.name);
        vec![Effect::Play {
            path,
            crop: self.active_crop().map(str::to_string),
        }]
    }

    fn toggle_crop(&mut self) {
        let Some(crop) = &self.crop else {
            self.status = "No crop value set (start with --crop)".to_string();
            return;
        };
        self.crop_enabled = !self.crop_enabled;
        self.status = if self.crop_enabled {
            format!("Crop enabled ({})", crop)
        } else {
            "Crop disabled".to_string()
        };
    }

    fn commit_tags(&mut self, input: &str) -> Vec<Effect> {
        let Some(v) = self.selected() else {
            self.status = "No video selected".to_string();
            return Vec::new();
        };
        let path = v.path.clone();
        self.status = format!("Saving tags for {}", v.name);
        vec![Effect::SaveTags {
            path,
            tags: tags::parse_tag_input(input),
        }]
    }

    fn on_tags_saved(&mut self, path: PathBuf, result: Result<Vec<String>, String>) {
        let saved = match result {
            Ok(t) => t,
            Err(e) => {
                self.status = format!("Tag save error: {}", e);
                return;
            }
        };
        if let Some(v) = self.videos.iter_mut().find(|v| v.path == path) {
            v.tags = saved.clone();
        }
        self.refilter();
        self.restore_selection(Some(path));
        self.status = if saved.is_empty() {
            "Tags cleared".to_string()
        } else {
            format!("Tags updated ({})", saved.len())
        };
    }

    // ── accessors ───────────────────────────────────────────────────────

    pub fn videos(&self) -> &[VideoEntry] {
        &self.videos
    }

    pub fn visible(&self) -> &[VideoEntry] {
        &self.filtered
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&VideoEntry> {
        self.filtered.get(self.cursor)
    }

    fn selected_path(&self) -> Option<PathBuf> {
        self.selected().map(|v| v.path.clone())
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn durations_pending(&self) -> bool {
        self.durations.is_active()
    }

    pub fn active_crop(&self) -> Option<&str> {
        if self.crop_enabled {
            self.crop.as_deref()
        } else {
            None
        }
    }

    /// Base status plus the latest transient message.
    pub fn status_text(&self) -> String {
        let status = self.status.trim();
        let base = self.base_status.trim();
        match (base.is_empty(), status.is_empty()) {
            (true, _) => status.to_string(),
            (false, true) => base.to_string(),
            _ if status == base => base.to_string(),
            _ => format!("{} • {}", base, status),
        }
    }

    pub fn progress_line(&self) -> Option<String> {
        if !self.durations.is_active() {
            return None;
        }
        let (done, total) = (self.durations.done(), self.durations.total());
        Some(format!(
            "Duration scan {} {}/{}",
            render_progress_bar(done, total, PROGRESS_BAR_WIDTH),
            done,
            total
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn entry(name: &str, minutes: u64) -> VideoEntry {
        let mut v = VideoEntry::new(PathBuf::from(format!("/v/{}", name)));
        v.duration = Duration::from_secs(minutes * 60);
        v.modified = Some(UNIX_EPOCH + Duration::from_secs(1000));
        v
    }

    fn loaded(videos: Vec<VideoEntry>) -> Event {
        let pending = videos
            .iter()
            .filter(|v| v.duration.is_zero() && v.error.is_none())
            .map(|v| v.path.clone())
            .collect();
        Event::VideosLoaded(Box::new(Loaded {
            library: Ok(Library {
                videos,
                pending,
                tag_warning: None,
            }),
            cache_warning: None,
            cache: Arc::new(DurationCache::new("/unused.json")),
        }))
    }

    fn tick(scan: u64, processed: usize, total: usize, done: bool) -> Event {
        Event::ProgressTick {
            scan,
            snapshot: ProgressSnapshot {
                processed,
                total,
                done,
            },
        }
    }

    fn resolved(path: &PathBuf, minutes: u64) -> Event {
        Event::DurationResolved {
            path: path.clone(),
            result: Ok(Duration::from_secs(minutes * 60)),
        }
    }

    fn probes(effects: &[Effect]) -> Vec<PathBuf> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Probe(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    // ── loading ─────────────────────────────────────────────────────────

    #[test]
    fn init_schedules_scan_and_tick() {
        let m = Model::new(4, None);
        assert_eq!(m.init(), vec![Effect::Scan, Effect::TickProgress(1)]);
        assert!(m.is_loading());
    }

    #[test]
    fn progress_ticks_until_done() {
        let mut m = Model::new(4, None);
        let fx = m.update(tick(1, 1, 4, false));
        assert_eq!(fx, vec![Effect::TickProgress(1)]);
        assert_eq!(m.status_text(), "Loading videos 1/4...");
        let fx = m.update(tick(1, 4, 4, true));
        assert!(fx.is_empty());
    }

    #[test]
    fn stale_ticks_do_not_rearm_after_reindex() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5)]));
        assert_eq!(m.update(Event::Reindex), vec![Effect::Scan, Effect::TickProgress(2)]);

        // A tick from the first scan wakes up during the rescan.
        assert!(m.update(tick(1, 0, 1, false)).is_empty());
        assert_eq!(m.update(tick(2, 0, 1, false)), vec![Effect::TickProgress(2)]);
    }

    #[test]
    fn load_failure_sets_error_state() {
        let mut m = Model::new(4, None);
        let fx = m.update(Event::VideosLoaded(Box::new(Loaded {
            library: Err("cannot read directory /x".into()),
            cache_warning: None,
            cache: Arc::new(DurationCache::new("/unused.json")),
        })));
        assert!(fx.is_empty());
        assert!(!m.is_loading());
        assert_eq!(m.load_error(), Some("cannot read directory /x"));
        assert_eq!(m.status_text(), "error: cannot read directory /x");
    }

    #[test]
    fn cached_library_needs_no_probes() {
        let mut m = Model::new(4, None);
        let fx = m.update(loaded(vec![entry("a.mp4", 5), entry("b.mp4", 20)]));
        assert!(fx.is_empty());
        assert_eq!(m.visible().len(), 2);
        assert_eq!(m.status_text(), "Loaded 2 videos");
        assert!(m.progress_line().is_none());
    }

    #[test]
    fn empty_library_status() {
        let mut m = Model::new(4, None);
        m.update(loaded(Vec::new()));
        assert_eq!(m.status_text(), "No videos found");
    }

    // ── worker pool ─────────────────────────────────────────────────────

    #[test]
    fn eight_pending_four_workers() {
        let mut m = Model::new(4, None);
        let vids: Vec<_> = (0..8).map(|i| entry(&format!("{}.mp4", i), 0)).collect();
        let paths: Vec<_> = vids.iter().map(|v| v.path.clone()).collect();

        let first = probes(&m.update(loaded(vids)));
        assert_eq!(first, paths[..4].to_vec());
        assert_eq!(m.progress_line().unwrap(), format!("Duration scan [{}] 0/8", "-".repeat(24)));

        let mut in_flight: Vec<PathBuf> = first;
        let mut flushes = 0;
        let mut resolved_count = 0;
        while let Some(p) = in_flight.first().cloned() {
            in_flight.remove(0);
            let fx = m.update(resolved(&p, 10));
            resolved_count += 1;
            if fx.contains(&Effect::FlushCache) {
                flushes += 1;
                assert_eq!(resolved_count, 8, "flush only after every probe resolved");
                assert!(in_flight.is_empty());
            }
            in_flight.extend(probes(&fx));
            assert!(in_flight.len() <= 4);
        }
        assert_eq!(flushes, 1);
        assert!(!m.durations_pending());
        assert!(m.videos().iter().all(|v| v.duration == Duration::from_secs(600)));
        assert_eq!(m.status_text(), "Loaded 8 videos, probing durations... • Durations ready (8 videos)");
    }

    #[test]
    fn probe_error_recorded_on_entry() {
        let mut m = Model::new(2, None);
        let v = entry("a.mp4", 0);
        let p = v.path.clone();
        m.update(loaded(vec![v]));
        let fx = m.update(Event::DurationResolved {
            path: p.clone(),
            result: Err("timed out after 15s".into()),
        });
        assert_eq!(fx, vec![Effect::FlushCache]);
        let got = &m.videos()[0];
        assert!(got.duration.is_zero());
        assert_eq!(got.error.as_deref(), Some("timed out after 15s"));
    }

    #[test]
    fn stale_result_ignored() {
        let mut m = Model::new(2, None);
        m.update(loaded(vec![entry("a.mp4", 0)]));
        let fx = m.update(resolved(&PathBuf::from("/v/other.mp4"), 3));
        assert!(fx.is_empty());
        assert!(m.durations_pending());
    }

    #[test]
    fn selection_survives_duration_updates() {
        let mut m = Model::new(4, None);
        m.update(Event::Sort(SortField::Duration));
        let a = entry("a.mp4", 0);
        let b = entry("b.mp4", 0);
        let c = entry("c.mp4", 30);
        let (pa, pb) = (a.path.clone(), b.path.clone());
        m.update(loaded(vec![a, b, c]));
        m.update(Event::Select(pb.clone()));
        assert_eq!(m.selected().unwrap().path, pb);

        // a jumps to the end after resolving to 60 min; b stays selected.
        m.update(resolved(&pa, 60));
        assert_eq!(m.selected().unwrap().path, pb);
        assert_eq!(m.visible().last().unwrap().path, pa);
    }

    #[test]
    fn reindex_merges_by_path() {
        let mut m = Model::new(4, None);
        let a = entry("a.mp4", 0);
        let pa = a.path.clone();
        let fx = m.update(loaded(vec![a.clone(), entry("b.mp4", 5)]));
        assert_eq!(probes(&fx), vec![pa.clone()]);

        assert_eq!(m.update(Event::Reindex), vec![Effect::Scan, Effect::TickProgress(2)]);
        assert!(m.update(Event::Reindex).is_empty());
        // The rescan still sees a as pending while its probe is in flight.
        let fx = m.update(loaded(vec![a, entry("c.mp4", 7)]));
        assert!(probes(&fx).is_empty());
        assert_eq!(m.videos().len(), 3);

        let fx = m.update(resolved(&pa, 12));
        assert_eq!(fx, vec![Effect::FlushCache]);
    }

    // ── filters / sort ──────────────────────────────────────────────────

    #[test]
    fn invalid_filters_leave_state_unchanged() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5), entry("b.mp4", 20)]));
        m.update(Event::ApplyFilters(FilterInputs {
            min_minutes: "10".into(),
            max_minutes: "999".into(),
            ..Default::default()
        }));
        assert_eq!(m.visible().len(), 1);
        let before = m.filters().clone();

        m.update(Event::ApplyFilters(FilterInputs {
            min_minutes: "30".into(),
            max_minutes: "10".into(),
            ..Default::default()
        }));
        assert_eq!(m.filters(), &before);
        assert_eq!(m.visible().len(), 1);
        assert!(m.status_text().ends_with("min minutes cannot exceed max minutes"));

        m.update(Event::ResetFilters);
        assert_eq!(m.visible().len(), 2);
    }

    #[test]
    fn sort_toggles_direction() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5), entry("b.mp4", 20)]));
        m.update(Event::Sort(SortField::Name));
        assert_eq!(m.visible()[0].name, "b.mp4");
        m.update(Event::Sort(SortField::Duration));
        assert!(m.sort_order().ascending);
        assert_eq!(m.visible()[0].name, "a.mp4");
    }

    #[test]
    fn cursor_moves_within_bounds() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5), entry("b.mp4", 20)]));
        m.update(Event::MoveCursor(-3));
        assert_eq!(m.cursor(), 0);
        m.update(Event::MoveCursor(5));
        assert_eq!(m.cursor(), 1);
    }

    // ── actions ─────────────────────────────────────────────────────────

    #[test]
    fn play_uses_active_crop() {
        let mut m = Model::new(4, Some("5:4".into()));
        m.update(loaded(vec![entry("a.mp4", 5)]));
        let fx = m.update(Event::Play);
        assert_eq!(
            fx,
            vec![Effect::Play {
                path: PathBuf::from("/v/a.mp4"),
                crop: Some("5:4".into())
            }]
        );
        m.update(Event::ToggleCrop);
        assert_eq!(m.active_crop(), None);
        let fx = m.update(Event::Play);
        assert!(matches!(&fx[0], Effect::Play { crop: None, .. }));
    }

    #[test]
    fn crop_toggle_without_value() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5)]));
        m.update(Event::ToggleCrop);
        assert!(m.status_text().ends_with("No crop value set (start with --crop)"));
    }

    #[test]
    fn play_with_empty_list_is_noop() {
        let mut m = Model::new(4, None);
        m.update(loaded(Vec::new()));
        assert!(m.update(Event::Play).is_empty());
    }

    #[test]
    fn tag_edit_roundtrip() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5), entry("b.mp4", 20)]));
        m.update(Event::MoveCursor(1));
        let fx = m.update(Event::SaveTags("Calm, core, calm".into()));
        let pb = PathBuf::from("/v/b.mp4");
        assert_eq!(
            fx,
            vec![Effect::SaveTags {
                path: pb.clone(),
                tags: vec!["Calm".into(), "core".into()]
            }]
        );
        m.update(Event::TagsSaved {
            path: pb.clone(),
            result: Ok(vec!["Calm".into(), "core".into()]),
        });
        assert_eq!(m.selected().unwrap().path, pb);
        assert_eq!(m.selected().unwrap().tags, vec!["Calm", "core"]);
        assert!(m.status_text().ends_with("Tags updated (2)"));

        m.update(Event::ApplyFilters(FilterInputs {
            tags: "COR".into(),
            ..Default::default()
        }));
        assert_eq!(m.visible().len(), 1);
    }

    #[test]
    fn tag_save_error_reported() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5)]));
        m.update(Event::TagsSaved {
            path: PathBuf::from("/v/a.mp4"),
            result: Err("permission denied".into()),
        });
        assert!(m.status_text().ends_with("Tag save error: permission denied"));
        assert!(m.videos()[0].tags.is_empty());
    }

    #[test]
    fn player_result_status() {
        let mut m = Model::new(4, None);
        m.update(loaded(vec![entry("a.mp4", 5)]));
        m.update(Event::PlayerStarted {
            path: PathBuf::from("/v/a.mp4"),
            result: Err("No such file or directory".into()),
        });
        assert!(m.status_text().ends_with("Failed to launch player: No such file or directory"));
    }
}
