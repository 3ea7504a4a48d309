//! Effect executor for the view model.
//!
//! Every effect runs on its own thread and answers with exactly one event.
//! The runtime counts outstanding effects so a headless driver knows when
//! the model has gone quiet.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::config::Options;
use crate::duration_cache::{DurationCache, Fingerprint};
use crate::loader;
use crate::model::{Effect, Event, Loaded, Model};
use crate::player;
use crate::probe::DurationProber;
use crate::progress::LoadProgress;
use crate::tags;

pub struct Runtime {
    options: Options,
    prober: Arc<dyn DurationProber>,
    /// Opened by the first scan, then shared by every later scan and probe.
    cache: Option<Arc<DurationCache>>,
    progress: Arc<LoadProgress>,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    outstanding: usize,
}

impl Runtime {
    pub fn new(options: Options, prober: Arc<dyn DurationProber>) -> Self {
        let (tx, rx) = mpsc::channel();
        Runtime {
            options,
            prober,
            cache: None,
            progress: Arc::new(LoadProgress::new()),
            tx,
            rx,
            outstanding: 0,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn cache(&self) -> Option<&Arc<DurationCache>> {
        self.cache.as_ref()
    }

    /// Run `model.init()` effects.
    pub fn start(&mut self, model: &Model) {
        for effect in model.init() {
            self.execute(effect);
        }
    }

    /// Feed one event to the model and execute what it asks for.
    pub fn dispatch(&mut self, model: &mut Model, event: Event) {
        if let Event::VideosLoaded(loaded) = &event {
            if self.cache.is_none() {
                self.cache = Some(Arc::clone(&loaded.cache));
            }
        }
        for effect in model.update(event) {
            self.execute(effect);
        }
    }

    /// Pump events until no effect is outstanding.
    pub fn run_until_idle(&mut self, model: &mut Model) {
        while self.outstanding > 0 {
            let Ok(event) = self.rx.recv() else {
                warn!("event channel closed with {} outstanding", self.outstanding);
                return;
            };
            self.outstanding -= 1;
            self.dispatch(model, event);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    pub fn execute(&mut self, effect: Effect) {
        self.outstanding += 1;
        let tx = self.tx.clone();
        match effect {
            Effect::Scan => self.scan(tx),
            Effect::TickProgress(scan) => {
                let progress = Arc::clone(&self.progress);
                let tick = self.options.progress_tick;
                thread::spawn(move || {
                    thread::sleep(tick);
                    tx.send(Event::ProgressTick {
                        scan,
                        snapshot: progress.snapshot(),
                    })
                    .ok();
                });
            }
            Effect::Probe(path) => self.probe(tx, path),
            Effect::FlushCache => {
                let cache = self.cache.clone();
                thread::spawn(move || {
                    let result = match cache {
                        Some(c) => c.flush().map_err(|e| e.to_string()),
                        None => Ok(false),
                    };
                    tx.send(Event::CacheFlushed(result)).ok();
                });
            }
            Effect::SaveTags { path, tags } => {
                thread::spawn(move || {
                    let result = tags::save(&path, &tags)
                        .and_then(|()| tags::load(&path))
                        .map_err(|e| e.to_string());
                    if result.is_ok() {
                        info!("tags saved for {}", path.display());
                    }
                    tx.send(Event::TagsSaved { path, result }).ok();
                });
            }
            Effect::Play { path, crop } => {
                let result =
                    player::launch(&self.options.player, &path, crop.as_deref()).map_err(|e| e.to_string());
                tx.send(Event::PlayerStarted { path, result }).ok();
            }
        }
    }

    fn scan(&self, tx: Sender<Event>) {
        let root = self.options.root.clone();
        let cache_path = self.options.duration_cache_path();
        let existing = self.cache.clone();
        let progress = Arc::clone(&self.progress);
        progress.reset();
        thread::spawn(move || {
            let (cache, cache_warning) = match existing {
                Some(c) => (c, None),
                None => {
                    let (c, err) = DurationCache::open(&cache_path);
                    if let Some(e) = &err {
                        warn!("duration cache: {}", e);
                    }
                    (Arc::new(c), err.map(|e| e.to_string()))
                }
            };
            debug!("scan start: {}", root.display());
            let library = loader::load_library(&root, &cache, Some(&progress)).map_err(|e| e.to_string());
            progress.mark_done();
            tx.send(Event::VideosLoaded(Box::new(Loaded {
                library,
                cache_warning,
                cache,
            })))
            .ok();
        });
    }

    fn probe(&self, tx: Sender<Event>, path: PathBuf) {
        let prober = Arc::clone(&self.prober);
        let cache = self.cache.clone();
        thread::spawn(move || {
            let result = match std::fs::metadata(&path) {
                Err(e) => Err(e.to_string()),
                Ok(meta) => {
                    let fp = Fingerprint::from_metadata(&meta);
                    prober
                        .probe(&path)
                        .inspect(|d| {
                            if let Some(c) = &cache {
                                c.record(&path, &fp, *d);
                            }
                        })
                        .map_err(|e| e.to_string())
                }
            };
            if let Err(e) = &result {
                debug!("probe {}: {}", path.display(), e);
            }
            tx.send(Event::DurationResolved { path, result }).ok();
        });
    }
}
