use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;

use vydra::conversion;
use vydra::core::{config, init_logger, log_startup_config};
use vydra::download::task::run_registry_janitor;
use vydra::download::ytdlp;
use vydra::download::TaskRegistry;
use vydra::start_web_server;

mod cli;
use cli::{Cli, Commands};

/// Main entry point for the web service
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, working directory, socket binding).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Set up global panic handler so panics in spawned download tasks get logged
    // instead of vanishing with the task
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env before any config is read
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Dispatch to appropriate command
    match cli.command {
        Some(Commands::Serve { port, host }) => {
            let host = host.unwrap_or_else(|| config::WEB_HOST.clone());
            let port = port.unwrap_or(*config::WEB_PORT);
            run_server(&host, port).await
        }
        Some(Commands::Doctor) => run_doctor().await,
        None => {
            // No command specified - default to serving
            log::info!("No command specified, starting the web service");
            run_server(&config::WEB_HOST, *config::WEB_PORT).await
        }
    }
}

/// Start the web service together with its background janitor.
async fn run_server(host: &str, port: u16) -> Result<()> {
    log_startup_config(host, port).await;

    // Clear working directories left over from a previous run. Every task id
    // in there belongs to a registry that no longer exists.
    let work_root = config::work_dir();
    if work_root.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(&work_root).await {
            log::warn!("Failed to clear working directory {}: {}", work_root.display(), e);
        }
    }
    tokio::fs::create_dir_all(&work_root).await?;

    let registry = Arc::new(TaskRegistry::new());

    // Purge abandoned tasks and their working directories periodically
    tokio::spawn(run_registry_janitor(Arc::clone(&registry)));

    start_web_server(host, port, registry).await
}

/// Check the external tools and print their versions.
async fn run_doctor() -> Result<()> {
    println!("🩺 Vydra Doctor");
    println!("===============");

    let mut ready = true;

    match ytdlp::ytdlp_version().await {
        Ok(version) => println!("yt-dlp:  {}", version),
        Err(e) => {
            ready = false;
            println!("yt-dlp:  MISSING ({})", e);
        }
    }

    match conversion::ffmpeg_version().await {
        Ok(version) => println!("ffmpeg:  {}", version),
        Err(e) => {
            ready = false;
            println!("ffmpeg:  MISSING ({})", e);
        }
    }

    if conversion::check_ffprobe().await {
        println!("ffprobe: ok");
    } else {
        ready = false;
        println!("ffprobe: MISSING");
    }

    println!();
    if ready {
        println!("✅ All external tools are available.");
        Ok(())
    } else {
        println!("❌ Some external tools are missing. Downloads will fail until they are installed.");
        Err(anyhow::anyhow!("missing external tools"))
    }
}
