//! Video metadata extraction and probing utilities.
//!
//! This module provides functions for extracting metadata from media
//! sources using yt-dlp and ffprobe. It includes:
//!
//! - Title/thumbnail/quality discovery via `--dump-single-json`
//! - Quality label parsing ("1080p" -> 1080)
//! - Height and stream probing of downloaded files via ffprobe
//! - Locating the merged output file inside a task work directory

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::process::{run_with_timeout, FFPROBE_TIMEOUT};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, get_error_message};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::timeout;
use url::Url;

static QUALITY_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)p").expect("quality label regex"));

/// Metadata shown to the user before a download starts.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub title: String,
    pub thumbnail: Option<String>,
    /// Available video heights, rendered "1080p", "720p", ... highest first
    pub qualities: Vec<String>,
}

/// Fetches title, thumbnail and the available qualities for a URL.
///
/// Runs `yt-dlp --dump-single-json` and parses the info JSON. Failures are
/// classified into a user-facing message; the raw stderr goes to the log.
pub async fn fetch_video_info(url: &Url) -> AppResult<VideoInfo> {
    let ytdl_bin = &*config::YTDL_BIN;
    log::debug!("Fetching video info via {} for URL: {}", ytdl_bin, url);

    let output = timeout(
        config::download::ytdlp_timeout(),
        Command::new(ytdl_bin)
            .args(["--dump-single-json", "--no-playlist", "--skip-download"])
            .arg(url.as_str())
            .output(),
    )
    .await
    .map_err(|_| {
        log::error!(
            "yt-dlp info fetch timed out after {} seconds",
            config::download::YTDLP_TIMEOUT_SECS
        );
        AppError::Download("yt-dlp command timed out".to_string())
    })?
    .map_err(|e| {
        log::error!("Failed to execute {}: {}", ytdl_bin, e);
        AppError::Download(format!("Failed to run {}: {}", ytdl_bin, e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let error_type = analyze_ytdlp_error(&stderr);
        log::error!("yt-dlp info fetch failed, error type: {:?}", error_type);
        log::error!("yt-dlp stderr: {}", stderr.trim());
        return Err(AppError::Download(get_error_message(&error_type)));
    }

    let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let title = info.get("title").and_then(|v| v.as_str()).unwrap_or("N/A").to_string();
    let thumbnail = info
        .get("thumbnail")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    let qualities = extract_qualities(&info);

    log::info!("Video info: title='{}', {} quality option(s)", title, qualities.len());

    Ok(VideoInfo {
        title,
        thumbnail,
        qualities,
    })
}

/// Collects distinct video heights from a yt-dlp info JSON.
///
/// A format counts as video when its `vcodec` is present and not `"none"`
/// and it reports a positive height.
fn extract_qualities(info: &serde_json::Value) -> Vec<String> {
    let mut heights: BTreeSet<u64> = BTreeSet::new();

    if let Some(formats) = info.get("formats").and_then(|v| v.as_array()) {
        for format in formats {
            let has_video = format
                .get("vcodec")
                .and_then(|v| v.as_str())
                .map_or(false, |codec| codec != "none");
            if !has_video {
                continue;
            }
            if let Some(height) = format.get("height").and_then(|v| v.as_u64()) {
                if height > 0 {
                    heights.insert(height);
                }
            }
        }
    }

    heights.iter().rev().map(|h| format!("{}p", h)).collect()
}

/// Gets the video title via `yt-dlp --print "%(title)s"`.
///
/// Empty output is an error; callers decide on a fallback.
pub async fn fetch_video_title(url: &Url) -> AppResult<String> {
    let ytdl_bin = &*config::YTDL_BIN;
    log::debug!("Fetching title for URL: {}", url);

    let output = timeout(
        config::download::ytdlp_timeout(),
        Command::new(ytdl_bin)
            .args(["--print", "%(title)s", "--no-playlist", "--skip-download"])
            .arg(url.as_str())
            .output(),
    )
    .await
    .map_err(|_| {
        log::error!(
            "yt-dlp title fetch timed out after {} seconds",
            config::download::YTDLP_TIMEOUT_SECS
        );
        AppError::Download("yt-dlp command timed out".to_string())
    })?
    .map_err(|e| AppError::Download(format!("Failed to get title: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let error_type = analyze_ytdlp_error(&stderr);
        log::error!("yt-dlp failed to get title, error type: {:?}", error_type);
        log::error!("yt-dlp stderr: {}", stderr.trim());
        return Err(AppError::Download(get_error_message(&error_type)));
    }

    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if title.is_empty() {
        return Err(AppError::Download(
            "Failed to get video title. Video might be unavailable or private.".to_string(),
        ));
    }

    Ok(title)
}

/// Extracts the height from a quality label like "1080p" or "720p60".
pub fn parse_quality_label(label: &str) -> Option<u32> {
    QUALITY_LABEL_RE
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Probes the height of the first video stream using ffprobe.
pub async fn probe_video_height(path: &Path) -> AppResult<u32> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-select_streams",
        "v:0",
        "-show_entries",
        "stream=height",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(path);

    let output = run_with_timeout(&mut cmd, FFPROBE_TIMEOUT).await?;

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<u32>()
        .map_err(|_| AppError::Download(format!("ffprobe returned no height for {}", path.display())))
}

/// Checks that a media file contains both a video and an audio stream.
pub async fn has_both_video_and_audio(path: &Path) -> AppResult<bool> {
    let has_video = probe_stream_present(path, "v:0").await?;
    let has_audio = probe_stream_present(path, "a:0").await?;
    Ok(has_video && has_audio)
}

async fn probe_stream_present(path: &Path, selector: &str) -> AppResult<bool> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-select_streams",
        selector,
        "-show_entries",
        "stream=codec_type",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(path);

    let output = run_with_timeout(&mut cmd, FFPROBE_TIMEOUT).await?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Locates the merged download output inside a task work directory.
///
/// yt-dlp merges into `source_video.mp4`; when the requested container is
/// not possible it falls back to mkv, and in rare cases to something else
/// entirely, so the directory is scanned as a last resort.
pub fn find_downloaded_source(work_dir: &Path) -> AppResult<PathBuf> {
    let mp4 = work_dir.join("source_video.mp4");
    if mp4.exists() {
        return Ok(mp4);
    }

    let mkv = work_dir.join("source_video.mkv");
    if mkv.exists() {
        log::warn!("Merged output is mkv, expected mp4: {}", mkv.display());
        return Ok(mkv);
    }

    let entries = std::fs::read_dir(work_dir)?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("source_video.") && !name.ends_with(".part") && !name.ends_with(".ytdl") {
            log::warn!("Using fallback source file: {}", name);
            return Ok(entry.path());
        }
    }

    Err(AppError::Download("Downloaded source file not found".to_string()))
}
