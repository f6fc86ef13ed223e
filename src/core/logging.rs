//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup checks for the external tools the service orchestrates
//! - A startup banner echoing the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::conversion::{check_ffprobe, ffmpeg_version};
use crate::core::config;
use crate::download::ytdlp::ytdlp_version;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration and external tool status at startup
///
/// Checks that yt-dlp, ffmpeg and ffprobe are actually runnable. A missing
/// tool is logged loudly but does not abort startup: requests that need it
/// will fail with a classified error instead.
pub async fn log_startup_config(host: &str, port: u16) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🦦 vydra v{}", env!("CARGO_PKG_VERSION"));
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match ytdlp_version().await {
        Ok(version) => log::info!("✅ yt-dlp ({}): {}", *config::YTDL_BIN, version),
        Err(e) => {
            log::error!("❌ yt-dlp ({}): not runnable: {}", *config::YTDL_BIN, e);
            log::error!("   Metadata and download requests will fail until it is installed");
        }
    }

    match ffmpeg_version().await {
        Ok(version) => log::info!("✅ ffmpeg: {}", version),
        Err(e) => {
            log::error!("❌ ffmpeg: not runnable: {}", e);
            log::error!("   Stream merging and re-encoding will fail until it is installed");
        }
    }

    if check_ffprobe().await {
        log::info!("✅ ffprobe: available");
    } else {
        log::warn!("⚠️  ffprobe: not runnable, downloads will skip the re-encode check");
    }

    log::info!("📁 Work dir: {}", config::work_dir().display());
    log::info!("📄 Log file: {}", *config::LOG_FILE_PATH);
    log::info!("🌐 Listening on http://{}:{}", host, port);
    log::info!("🔓 CORS origins: {}", config::CORS_ALLOWED_ORIGINS.join(", "));
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
