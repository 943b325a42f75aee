mod cli;

use scenevault::{
    config,
    generate::FfmpegGenerator,
    probe::{FfprobeProber, SceneProber},
    queue::ProcessingQueue,
    scanner::Scanner,
    store::{SceneStore, SqliteSceneStore},
    streaming::StreamNegotiator,
};
use scenevault_common::SceneId;
use scenevault_db::pool::{init_pool, DbPool};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct App {
    pool: DbPool,
    store: Arc<SqliteSceneStore>,
    config: config::Config,
}

fn open_app(config_path: Option<&Path>) -> Result<App> {
    let config = config::load_config_or_default(config_path)?;

    let db_path = config.database.path.to_string_lossy().to_string();
    tracing::info!("Initializing database at {}", db_path);
    let pool = init_pool(&db_path)?;
    let store = Arc::new(SqliteSceneStore::new(pool.clone()));

    Ok(App {
        pool,
        store,
        config,
    })
}

fn resolve_tool(explicit: Option<&Path>, name: &str) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => which::which(name).with_context(|| format!("{} not found on PATH", name)),
    }
}

fn build_prober(config: &config::Config) -> Result<FfprobeProber> {
    let binary = resolve_tool(config.tools.ffprobe_path.as_deref(), "ffprobe")?;
    Ok(FfprobeProber::new(
        binary,
        Duration::from_secs(config.processing.probe_timeout_secs),
    ))
}

fn build_queue(app: &App) -> Result<ProcessingQueue> {
    let prober = build_prober(&app.config)?;
    let ffmpeg = resolve_tool(app.config.tools.ffmpeg_path.as_deref(), "ffmpeg")?;
    let generator = FfmpegGenerator::new(
        ffmpeg,
        app.config.processing.generated_dir.clone(),
        Duration::from_secs(app.config.processing.generate_timeout_secs),
    );

    Ok(ProcessingQueue::new(
        app.pool.clone(),
        app.store.clone(),
        Arc::new(prober),
        Arc::new(generator),
        app.config.processing.max_attempts,
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "scenevault=trace,scenevault_db=debug,scenevault_common=debug".to_string()
        } else {
            "scenevault=info,scenevault_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Scan { process } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_scan(cli.config.as_deref(), process))
        }
        Commands::Process => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_process(cli.config.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref(), json))
        }
        Commands::Streams { scene_id, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(show_streams(&scene_id, cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("scenevault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_scan(config_path: Option<&Path>, process: bool) -> Result<()> {
    let app = open_app(config_path)?;
    if app.config.library.paths.is_empty() {
        anyhow::bail!("No library paths configured; set [library] paths in the config file");
    }

    let queue = build_queue(&app)?;
    let excludes = config::compile_excludes(&app.config)?;
    let scanner = Scanner::new(app.store.clone(), excludes);

    let summary = scanner.scan(&app.config.library.paths, &queue)?;
    println!(
        "Scan complete: {} new, {} known, {} excluded, {} queued",
        summary.discovered, summary.known, summary.excluded, summary.enqueued
    );

    if process {
        drain_queue(&queue).await?;
    } else if queue.len()? > 0 {
        println!(
            "{} scenes waiting; run `scenevault process` to process them",
            queue.len()?
        );
    }

    Ok(())
}

async fn run_process(config_path: Option<&Path>) -> Result<()> {
    let app = open_app(config_path)?;
    let queue = build_queue(&app)?;
    drain_queue(&queue).await
}

async fn drain_queue(queue: &ProcessingQueue) -> Result<()> {
    let backlog = queue.len()?;
    if backlog == 0 {
        println!("Queue is empty, nothing to process");
        return Ok(());
    }

    println!("Processing {} queued scenes...", backlog);
    let summary = queue.process_loop().await?;
    println!(
        "Done: {} processed, {} retried and requeued, {} dropped, {} skipped",
        summary.completed, summary.requeued, summary.dropped, summary.skipped
    );
    Ok(())
}

async fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = build_prober(&config)?;
    let meta = prober
        .probe(file)
        .await
        .with_context(|| format!("Failed to probe {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("File: {}", file.display());
        println!("Container: {}", meta.container);
        println!("Video: {}", meta.video_codec);
        if let Some(ref audio) = meta.audio_codec {
            println!("Audio: {}", audio);
        }
        if let (Some(w), Some(h)) = (meta.width, meta.height) {
            println!("Resolution: {}x{}", w, h);
        }
        if let Some(duration) = meta.duration_secs {
            let secs = duration as u64;
            let mins = secs / 60;
            let hours = mins / 60;
            println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
        }
    }

    Ok(())
}

async fn show_streams(scene_id: &str, config_path: Option<&Path>, json: bool) -> Result<()> {
    let scene_id = SceneId::parse(scene_id).context("Invalid scene ID")?;

    let app = open_app(config_path)?;
    let scene = app
        .store
        .get_by_id(scene_id)?
        .with_context(|| format!("Scene not found: {}", scene_id))?;

    let prober = build_prober(&app.config)?;
    let negotiator = StreamNegotiator::new(app.store.clone(), Arc::new(prober));
    let streams = negotiator.available_streams(&scene).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&streams)?);
        return Ok(());
    }

    if streams.is_empty() {
        println!("Scene has no file; no playback options");
        return Ok(());
    }
    for (i, stream) in streams.iter().enumerate() {
        let mime = stream.mime_type.as_deref().unwrap_or("(sniffed)");
        let mode = if stream.requires_transcode {
            "transcode pipeline"
        } else {
            "raw file"
        };
        println!("{}. {} - {} [{}]", i + 1, stream.label, mime, mode);
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = [
        ("ffprobe", config.tools.ffprobe_path.as_deref()),
        ("ffmpeg", config.tools.ffmpeg_path.as_deref()),
    ];
    let mut all_ok = true;

    for (name, explicit) in tools {
        match resolve_tool(explicit, name) {
            Ok(path) => {
                print!("✓ {} - {}", name, path.display());
                if let Some(version) = tool_version(&path) {
                    print!(" ({})", version);
                }
                println!();
            }
            Err(_) => {
                all_ok = false;
                println!("✗ {} - not found", name);
            }
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn tool_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path).arg("-version").output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(|line| line.to_string())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Library paths: {}", config.library.paths.len());
            println!("  Exclude patterns: {}", config.library.exclude_files.len());
            println!("  Max attempts: {}", config.processing.max_attempts);
            println!("  Database: {:?}", config.database.path);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Database: {:?}", config.database.path);
            println!("  Max attempts: {}", config.processing.max_attempts);
        }
    }

    Ok(())
}
