mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, PathArgs};
use lp_av::{FfmpegTransformer, FfprobeDurationProbe, ToolRegistry};
use lp_core::config::{Config, FailurePolicy};
use lp_core::CourseId;
use lp_pipeline::{
    low_quality_lesson, package_corpus, remux_lesson, PipelineContext, SourceCorpus, StageOutput,
};
use lp_store::{prepare_output_dir, FsStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "lessonpack=debug,lp_pipeline=debug,lp_store=debug,lp_av=debug,lp_core=debug"
                .to_string()
        } else {
            "lessonpack=info,lp_pipeline=info,lp_store=warn,lp_av=warn,lp_core=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Build {
            paths,
            output,
            clean,
            concurrency,
            on_course_failure,
            build_version,
            cas_base_url,
        } => {
            let mut config = load_config(config_path, &paths)?;
            if let Some(dir) = output {
                config.output.dir = dir;
            }
            if let Some(n) = concurrency {
                config.pipeline.concurrency = n;
            }
            if let Some(policy) = on_course_failure {
                config.pipeline.on_course_failure = policy;
            }
            if let Some(v) = build_version {
                config.manifest.build_version = v;
            }
            if let Some(url) = cas_base_url {
                config.manifest.cas_base_url = url;
            }
            runtime()?.block_on(build(config, clean))
        }
        Commands::RemuxLesson {
            paths,
            course,
            index,
            out,
        } => {
            let config = load_config(config_path, &paths)?;
            runtime()?.block_on(single_lesson(config, Lesson::Remux, course, index, out))
        }
        Commands::LowQualityLesson {
            paths,
            course,
            index,
            out,
        } => {
            let config = load_config(config_path, &paths)?;
            runtime()?.block_on(single_lesson(config, Lesson::LowQuality, course, index, out))
        }
        Commands::ListCourses { corpus, json } => {
            let config = load_config(
                config_path,
                &PathArgs {
                    corpus,
                    cache_dir: None,
                },
            )?;
            runtime()?.block_on(list_courses(config, json))
        }
        Commands::CheckTools => check_tools(&Config::load_or_default(config_path)?),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("lessonpack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}

fn load_config(path: Option<&Path>, paths: &PathArgs) -> Result<Config> {
    let mut config = Config::load_or_default(path)?;
    if let Some(root) = &paths.corpus {
        config.corpus.root = root.clone();
    }
    if let Some(dir) = &paths.cache_dir {
        config.output.cache_dir = dir.clone();
    }
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }
    Ok(config)
}

fn pipeline_context(config: &Config) -> Result<PipelineContext> {
    let tools = ToolRegistry::discover(&config.tools);
    let transformer = FfmpegTransformer::from_registry(&tools)?;
    let probe = FfprobeDurationProbe::from_registry(&tools)?;
    let store = FsStore::open(&config.output.cache_dir)?;
    tracing::info!(cache = %store.root().display(), "using cache");

    Ok(
        PipelineContext::new(Arc::new(store), Arc::new(transformer), Arc::new(probe))
            .with_config(config),
    )
}

async fn build(config: Config, clean: bool) -> Result<()> {
    config.check_paths()?;
    let corpus = SourceCorpus::open(&config.corpus.root)?;
    // The output directory is emptied before the cache is opened.
    prepare_output_dir(&config.output.dir, clean).await?;
    let ctx = pipeline_context(&config)?;

    tracing::info!(
        corpus = %corpus.root().display(),
        output = %config.output.dir.display(),
        "starting build"
    );

    let build = package_corpus(&ctx, &corpus).await?;
    build
        .tree
        .write_to(&config.output.dir, ctx.store.as_ref())
        .await?;

    println!("Build complete: {}", config.output.dir.display());
    println!("  Courses: {}", build.manifest.courses.len());
    println!("  Objects: {}", build.tree.len());
    println!("  Cache hits: {}", build.hits);
    println!("  Computed: {}", build.computed);
    println!("  New cache entries: {}", build.new_entries.len());

    if !build.failures.is_empty() {
        println!("\nSkipped courses: {}", build.failures.len());
        for failure in &build.failures {
            println!("  ✗ {}: {}", failure.course, failure.error);
        }
        if config.pipeline.on_course_failure == FailurePolicy::Skip {
            println!("Use --on-course-failure abort to stop at the first failure.");
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Lesson {
    Remux,
    LowQuality,
}

async fn single_lesson(
    config: Config,
    kind: Lesson,
    course: String,
    index: i64,
    out: Option<PathBuf>,
) -> Result<()> {
    let corpus = SourceCorpus::open(&config.corpus.root)?;
    let course = CourseId::new(course);

    // Reject a bad index before looking for ffmpeg.
    corpus.course(&course).await?.position(index)?;

    let ctx = pipeline_context(&config)?;
    let result: StageOutput<_> = match kind {
        Lesson::Remux => remux_lesson(&ctx, &corpus, &course, index).await?,
        Lesson::LowQuality => low_quality_lesson(&ctx, &corpus, &course, index).await?,
    };

    let dest = out.unwrap_or_else(|| PathBuf::from(result.value.name()));
    tokio::fs::write(&dest, result.value.data())
        .await
        .with_context(|| format!("failed to write {}", dest.display()))?;

    println!("{}", dest.display());
    println!("  Object: {}", result.value.fingerprint());
    println!("  Size: {} bytes", result.value.len());
    println!(
        "  Cache: {}",
        if result.is_hit() { "hit" } else { "computed" }
    );
    Ok(())
}

async fn list_courses(config: Config, json: bool) -> Result<()> {
    let corpus = SourceCorpus::open(&config.corpus.root)?;
    let mut rows = Vec::new();

    for id in corpus.course_ids().await? {
        let row = match corpus.course(&id).await {
            Ok(course) => serde_json::json!({ "id": id, "tracks": course.len() }),
            Err(e) => serde_json::json!({ "id": id, "error": e.to_string() }),
        };
        rows.push(row);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Courses: {}", rows.len());
    for row in &rows {
        let id = row["id"].as_str().unwrap_or_default();
        match row["tracks"].as_u64() {
            Some(n) => println!("  {id}: {n} tracks"),
            None => println!("  {id}: {}", row["error"].as_str().unwrap_or_default()),
        }
    }
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({version})");
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Builds need both ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            if !p.exists() {
                anyhow::bail!("Config file does not exist: {}", p.display());
            }
            let config = Config::load_or_default(Some(p))?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Corpus: {}", config.corpus.root.display());
    println!("  Output: {}", config.output.dir.display());
    println!("  Cache: {}", config.output.cache_dir.display());
    println!("  Concurrency: {}", config.pipeline.concurrency);
    println!("  On course failure: {}", config.pipeline.on_course_failure);
    println!("  Build version: {}", config.manifest.build_version);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  ! {warning}");
        }
    }

    Ok(())
}
