//! CLI subcommand implementations.
//!
//! Each command loads the library through the same model/runtime pair an
//! interactive front-end would use, waits for it to go idle, then prints.

use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::config::Options;
use crate::filters::{FilterInputs, FilterState, SortField};
use crate::model::{Effect, Event, Model};
use crate::player;
use crate::probe::{DurationProber, Ffprobe};
use crate::runtime::Runtime;
use crate::tags;
use crate::thumbs::{self, ThumbnailCache, ThumbnailGenerator};
use crate::video::base_name;
use crate::view::{video_row, Row};

/// Filter and sort selection from the command line.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub inputs: FilterInputs,
    pub sort: SortField,
    pub descending: bool,
}

fn prober(options: &Options) -> Arc<dyn DurationProber> {
    Arc::new(Ffprobe::with_binary(options.probe_bin.clone(), options.probe_timeout))
}

/// Scan, probe every missing duration and flush the cache.
fn load(options: &Options) -> Result<(Runtime, Model)> {
    let mut model = Model::new(options.worker_cap, options.crop.clone());
    let mut rt = Runtime::new(options.clone(), prober(options));
    rt.start(&model);
    rt.run_until_idle(&mut model);
    if let Some(e) = model.load_error() {
        bail!("{}", e);
    }
    Ok((rt, model))
}

fn apply_query(rt: &mut Runtime, model: &mut Model, query: &Query) -> Result<()> {
    // Validate up front so a bad bound is a hard error here, not a status line.
    FilterState::from_inputs(&query.inputs)?;
    rt.dispatch(model, Event::ApplyFilters(query.inputs.clone()));
    if query.sort != model.sort_order().field {
        rt.dispatch(model, Event::Sort(query.sort));
    }
    if query.descending {
        rt.dispatch(model, Event::Sort(query.sort));
    }
    Ok(())
}

pub fn list(options: &Options, query: &Query) -> Result<()> {
    let (mut rt, mut model) = load(options)?;
    apply_query(&mut rt, &mut model, query)?;

    let now = SystemTime::now();
    let order = model.sort_order();
    println!(
        "Filters: {}  Sort: {} {}",
        model.filters().describe(),
        order.field.name(),
        if order.ascending { "asc" } else { "desc" }
    );
    print_row(&Row {
        name: "NAME".into(),
        duration: "DURATION".into(),
        age: "MODIFIED".into(),
        tags: "TAGS".into(),
    });
    for v in model.visible() {
        print_row(&video_row(v, now));
    }
    eprintln!("{}", model.status_text());
    Ok(())
}

fn print_row(r: &Row) {
    println!("{:<48} {:>10} {:>12}  {}", r.name, r.duration, r.age, r.tags);
}

/// Launch the player on the first row of the filtered list.
pub fn play(options: &Options, query: &Query) -> Result<()> {
    let (mut rt, mut model) = load(options)?;
    apply_query(&mut rt, &mut model, query)?;

    let effects = model.update(Event::Play);
    let Some(Effect::Play { path, crop }) = effects.into_iter().next() else {
        bail!("no matching videos");
    };
    player::launch(&options.player, &path, crop.as_deref())
        .with_context(|| format!("failed to launch {}", options.player))?;
    model.update(Event::PlayerStarted {
        path,
        result: Ok(()),
    });
    println!("{}", model.status_text());
    Ok(())
}

pub fn tag(file: &Path, input: &str) -> Result<()> {
    let file = std::path::absolute(file).with_context(|| format!("resolve {}", file.display()))?;
    if !file.is_file() {
        bail!("{}: not a file", file.display());
    }
    tags::save(&file, &tags::parse_tag_input(input))?;
    let saved = tags::load(&file)?;
    if saved.is_empty() {
        println!("Tags cleared for {}", base_name(&file));
    } else {
        println!("Tags for {}: {}", base_name(&file), saved.join(", "));
    }
    Ok(())
}

/// Generate thumbnails for every loaded video that lacks a current one.
pub fn thumbs(options: &Options) -> Result<()> {
    let (_rt, model) = load(options)?;
    thumbs::ensure_ffmpeg();
    let cache = ThumbnailCache::open(options.thumbnail_cache_path())?;
    let generator = ThumbnailGenerator::new(prober(options));

    let (mut made, mut fresh, mut failed) = (0usize, 0usize, 0usize);
    for v in model.videos() {
        let Some(modified) = v.modified else {
            continue;
        };
        if v.error.is_some() {
            continue;
        }
        if cache.lookup(&v.path, modified).is_some() {
            fresh += 1;
            continue;
        }
        match generator.generate(&v.path, v.duration) {
            Ok(thumb) => {
                cache.store(&v.path, modified, &thumb)?;
                println!("  {}", thumb.display());
                made += 1;
            }
            Err(e) => {
                warn!("thumbnail {}: {:#}", v.path.display(), e);
                eprintln!("  {}: {:#}", v.name, e);
                failed += 1;
            }
        }
    }
    println!(
        "Done. {} generated, {} up to date, {} failed.",
        made, fresh, failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options(root: &Path) -> Options {
        let mut o = Options::new(root.to_path_buf(), None);
        // Fails every probe quickly; durations stay unknown.
        o.probe_bin = "nonexistent-ffprobe-binary".into();
        o.progress_tick = Duration::from_millis(5);
        o
    }

    #[test]
    fn list_on_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        list(&options(dir.path()), &Query::default()).unwrap();
    }

    #[test]
    fn list_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list(&options(&dir.path().join("gone")), &Query::default()).is_err());
    }

    #[test]
    fn bad_bounds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let query = Query {
            inputs: FilterInputs {
                min_minutes: "30".into(),
                max_minutes: "10".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = list(&options(dir.path()), &query).unwrap_err();
        assert_eq!(err.to_string(), "min minutes cannot exceed max minutes");
    }

    #[test]
    fn query_sets_sort_order() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let (mut rt, mut model) = load(&opts).unwrap();
        let query = Query {
            sort: SortField::Age,
            descending: true,
            ..Default::default()
        };
        apply_query(&mut rt, &mut model, &query).unwrap();
        assert_eq!(model.sort_order().field, SortField::Age);
        assert!(!model.sort_order().ascending);

        let query = Query {
            descending: true,
            ..Default::default()
        };
        let (mut rt, mut model) = load(&opts).unwrap();
        apply_query(&mut rt, &mut model, &query).unwrap();
        assert_eq!(model.sort_order().field, SortField::Name);
        assert!(!model.sort_order().ascending);
    }

    #[test]
    fn play_without_matches_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = play(&options(dir.path()), &Query::default()).unwrap_err();
        assert_eq!(err.to_string(), "no matching videos");
    }

    #[test]
    fn tag_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("flow.mp4");
        std::fs::write(&video, b"x").unwrap();
        tag(&video, "b, a, B").unwrap();
        assert_eq!(tags::load(&video).unwrap(), vec!["a", "b"]);
        assert!(dir.path().join("flow.json").exists());
    }

    #[test]
    fn tag_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tag(&dir.path().join("none.mp4"), "a").is_err());
    }
}
