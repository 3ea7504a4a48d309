mod cli;
pub mod config;
mod debug;
pub mod duration_cache;
pub mod error;
pub mod filters;
pub mod jobs;
pub mod loader;
pub mod model;
pub mod player;
pub mod probe;
pub mod progress;
pub mod runtime;
pub mod scanner;
pub mod tags;
pub mod thumbs;
pub mod video;
pub mod view;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{resolve_root, Options, DEFAULT_ROOT};
use crate::filters::{FilterInputs, SortField};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("GIT_HASH");

#[derive(Parser, Debug)]
#[command(name = "yoga", about = "Browse a local yoga video library", disable_version_flag = true)]
struct Cli {
    /// Directory or single video to browse (default ~/Yoga)
    #[arg(long, global = true, default_value = "")]
    root: String,

    /// Crop aspect passed to the player, e.g. 5:4
    #[arg(long, global = true)]
    crop: Option<String>,

    /// Print version and exit
    #[arg(long)]
    version: bool,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List videos (default)
    #[command(short_flag = 'l')]
    List(QueryArgs),
    /// Play the first matching video
    #[command(short_flag = 'p')]
    Play(QueryArgs),
    /// Set comma-separated tags on a video
    Tag { file: PathBuf, tags: String },
    /// Generate missing thumbnails
    Thumbs,
}

#[derive(Args, Debug, Default)]
struct QueryArgs {
    /// Name contains (case-insensitive)
    #[arg(long, default_value = "")]
    name: String,
    /// Minimum duration in minutes
    #[arg(long, default_value = "")]
    min: String,
    /// Maximum duration in minutes
    #[arg(long, default_value = "")]
    max: String,
    /// Any tag contains (case-insensitive)
    #[arg(long, default_value = "")]
    tag: String,
    #[arg(long, value_enum, default_value_t = SortKey::Name)]
    sort: SortKey,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SortKey {
    #[default]
    Name,
    Duration,
    Age,
}

impl From<SortKey> for SortField {
    fn from(k: SortKey) -> Self {
        match k {
            SortKey::Name => SortField::Name,
            SortKey::Duration => SortField::Duration,
            SortKey::Age => SortField::Age,
        }
    }
}

impl From<QueryArgs> for cli::Query {
    fn from(a: QueryArgs) -> Self {
        cli::Query {
            inputs: FilterInputs {
                name: a.name,
                min_minutes: a.min,
                max_minutes: a.max,
                tags: a.tag,
            },
            sort: a.sort.into(),
            descending: a.desc,
        }
    }
}

/// Parse args, run the command, return the process exit code.
pub fn run() -> i32 {
    let args = match Cli::try_parse() {
        Ok(a) => a,
        Err(e) => {
            // --help lands here too and is not a failure.
            let code = if e.use_stderr() { 2 } else { 0 };
            e.print().ok();
            return code;
        }
    };

    if args.version {
        println!("Yoga version {} ({})", VERSION, GIT_HASH);
        return 0;
    }

    debug::init(args.debug);

    match execute(args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {:#}", e);
            1
        }
    }
}

fn execute(args: Cli) -> Result<()> {
    let options = || -> Result<Options> {
        let root = resolve_root(&args.root, DEFAULT_ROOT)?;
        tracing::debug!("root: {}", root.display());
        Ok(Options::new(root, args.crop.clone()))
    };

    match args.command.unwrap_or_else(|| Commands::List(QueryArgs::default())) {
        Commands::List(q) => cli::list(&options()?, &q.into()),
        Commands::Play(q) => cli::play(&options()?, &q.into()),
        Commands::Tag { file, tags } => cli::tag(&file, &tags),
        Commands::Thumbs => cli::thumbs(&options()?),
    }
}
