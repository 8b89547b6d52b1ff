use clap::{Args, Parser, Subcommand};
use lp_core::config::FailurePolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lessonpack")]
#[command(author, version, about = "Content-addressed build pipeline for course audio")]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Locations shared by every command that touches the corpus or the cache.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Corpus root directory (overrides corpus.root)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Cache directory (overrides output.cache_dir)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every course into a sharded output tree with all-courses.json
    Build {
        #[command(flatten)]
        paths: PathArgs,

        /// Output directory (overrides output.dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove an existing, non-empty output directory first
        #[arg(long)]
        clean: bool,

        /// Maximum concurrent ffmpeg/ffprobe invocations
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// What to do when a course fails: skip or abort
        #[arg(long)]
        on_course_failure: Option<FailurePolicy>,

        /// Build version stamped into manifests
        #[arg(long)]
        build_version: Option<u32>,

        /// Base URL under which the output tree is served
        #[arg(long)]
        cas_base_url: Option<String>,
    },

    /// Remux a single lesson into a metadata-stripped mp4
    RemuxLesson {
        #[command(flatten)]
        paths: PathArgs,

        /// Course ID
        course: String,

        /// 0-based lesson index
        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// Where to write the result (defaults to <index>.mp4)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Produce the low-quality variant of a single lesson
    LowQualityLesson {
        #[command(flatten)]
        paths: PathArgs,

        /// Course ID
        course: String,

        /// 0-based lesson index
        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// Where to write the result (defaults to <index>-lq.mp4)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the courses of a corpus with their track counts
    ListCourses {
        /// Corpus root directory (overrides corpus.root)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
