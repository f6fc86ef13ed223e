//! Video download pipeline.
//!
//! `spawn_download` runs yt-dlp on a blocking task and streams parsed
//! progress events over a channel. `run_download_task` drives one task end
//! to end: download, merge, optional re-encode down to the requested
//! quality, completion bookkeeping in the registry.

use crate::conversion;
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::download_filename;
use crate::download::metadata::{
    fetch_video_title, find_downloaded_source, has_both_video_and_audio, parse_quality_label, probe_video_height,
};
use crate::download::progress::{parse_progress, DownloadEvent};
use crate::download::task::{TaskRegistry, TaskStatus};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, get_error_message};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use url::Url;

/// yt-dlp format selection: best mp4 video+audio pair, with fallbacks.
const FORMAT_ARG: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Starts a yt-dlp download into `work_dir` on a blocking task.
///
/// Returns a receiver for progress/merge events and the join handle of the
/// worker. Stdout is read line by line (`--newline` makes every progress
/// update its own line); stderr is drained on a thread and kept for error
/// classification when yt-dlp exits non-zero.
pub fn spawn_download(url: &Url, work_dir: &Path) -> (UnboundedReceiver<DownloadEvent>, JoinHandle<AppResult<()>>) {
    let ytdl_bin = config::YTDL_BIN.clone();
    let url_str = url.to_string();
    let output_template = work_dir.join("source_video.%(ext)s").to_string_lossy().to_string();

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = tokio::task::spawn_blocking(move || -> AppResult<()> {
        let socket_timeout = config::download::SOCKET_TIMEOUT_SECS.to_string();
        let retries = config::download::RETRIES.to_string();
        let fragment_retries = config::download::FRAGMENT_RETRIES.to_string();

        let args: Vec<&str> = vec![
            "-o",
            &output_template,
            "--newline",
            "--force-overwrites",
            "--no-playlist",
            "--format",
            FORMAT_ARG,
            "--merge-output-format",
            "mp4",
            "--socket-timeout",
            &socket_timeout,
            "--retries",
            &retries,
            "--fragment-retries",
            &fragment_retries,
            "--postprocessor-args",
            "Merger:-movflags +faststart",
            &url_str,
        ];

        log::debug!("yt-dlp command for video download: {} {}", ytdl_bin, args.join(" "));

        let mut child = Command::new(&ytdl_bin)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::Download(format!("Failed to spawn {}: {}", ytdl_bin, e)))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Kept for error classification; capped so a chatty run cannot
        // grow without bound
        let stderr_lines = Arc::new(std::sync::Mutex::new(VecDeque::<String>::new()));

        let tx_stderr = tx.clone();
        let stderr_lines_clone = Arc::clone(&stderr_lines);
        if let Some(stderr_stream) = stderr {
            std::thread::spawn(move || {
                capture_stderr_lines(BufReader::new(stderr_stream), &tx_stderr, &stderr_lines_clone);
            });
        }

        if let Some(stdout_stream) = stdout {
            forward_stdout_events(BufReader::new(stdout_stream), &tx);
        }

        let status = child
            .wait()
            .map_err(|e| AppError::Download(format!("downloader process failed: {}", e)))?;

        if status.success() {
            return Ok(());
        }

        let stderr_text = stderr_lines
            .lock()
            .map(|mut lines| lines.make_contiguous().join("\n"))
            .unwrap_or_default();
        let error_type = analyze_ytdlp_error(&stderr_text);
        let tail: Vec<&str> = stderr_text.lines().rev().take(5).collect();
        log::error!(
            "❌ yt-dlp exited with {}: {:?}\n{}",
            status,
            error_type,
            tail.into_iter().rev().collect::<Vec<_>>().join("\n")
        );
        Err(AppError::Download(get_error_message(&error_type)))
    });

    (rx, handle)
}

/// Forwards parsed events from the yt-dlp stdout stream.
///
/// A line that fails to decode is skipped, not treated as the end of the
/// stream; yt-dlp echoes titles and filenames and those are not always
/// valid UTF-8.
fn forward_stdout_events<R: BufRead>(reader: R, tx: &UnboundedSender<DownloadEvent>) {
    for line in reader.lines() {
        let Ok(line) = line else { continue };
        log::debug!("yt-dlp stdout: {}", line);
        if line.contains("[Merger]") {
            let _ = tx.send(DownloadEvent::Merging);
            continue;
        }
        if let Some(progress_info) = parse_progress(&line) {
            let _ = tx.send(DownloadEvent::Progress(progress_info));
        }
    }
}

/// Captures stderr lines for later error classification.
///
/// Undecodable lines are skipped the same way the stdout side skips them.
fn capture_stderr_lines<R: BufRead>(
    reader: R,
    tx: &UnboundedSender<DownloadEvent>,
    captured: &std::sync::Mutex<VecDeque<String>>,
) {
    for line in reader.lines() {
        let Ok(line) = line else { continue };
        log::debug!("yt-dlp stderr: {}", line);
        if let Ok(mut lines) = captured.lock() {
            lines.push_back(line.clone());
            if lines.len() > 200 {
                lines.pop_front();
            }
        }
        // Some yt-dlp builds print progress to stderr
        if let Some(progress_info) = parse_progress(&line) {
            let _ = tx.send(DownloadEvent::Progress(progress_info));
        }
    }
}

/// Drives one download task end to end.
///
/// Spawned per accepted download request. Any error marks the task failed
/// with a user-facing message and removes its work directory.
pub async fn run_download_task(registry: Arc<TaskRegistry>, task_id: String, url: Url, quality_label: String) {
    let work_dir = config::work_dir().join(&task_id);

    if let Err(e) = execute_download(&registry, &task_id, &url, &quality_label, &work_dir).await {
        registry.fail(&task_id, &e.to_string()).await;
        if work_dir.exists() {
            if let Err(rm_err) = tokio::fs::remove_dir_all(&work_dir).await {
                log::warn!("Failed to remove work dir {}: {}", work_dir.display(), rm_err);
            }
        }
    }
}

async fn execute_download(
    registry: &TaskRegistry,
    task_id: &str,
    url: &Url,
    quality_label: &str,
    work_dir: &Path,
) -> AppResult<()> {
    let start_time = std::time::Instant::now();

    registry
        .set_status(task_id, TaskStatus::Starting, "Preparing download...")
        .await;
    tokio::fs::create_dir_all(work_dir).await?;

    // The title drives the final filename; a failed lookup is not fatal
    let title = match fetch_video_title(url).await {
        Ok(title) => title,
        Err(e) => {
            log::warn!("Could not fetch title for {}: {}", url, e);
            "video".to_string()
        }
    };
    log::info!("⬇️ Task {}: downloading '{}' at {}", task_id, title, quality_label);

    let (mut rx, mut handle) = spawn_download(url, work_dir);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                match event {
                    DownloadEvent::Progress(info) => {
                        let message = match info.speed_mbs {
                            Some(speed) => format!("Downloading... ({:.1} MiB/s)", speed),
                            None => "Downloading...".to_string(),
                        };
                        registry.set_progress(task_id, info.percent, &message).await;
                    }
                    DownloadEvent::Merging => {
                        registry
                            .set_status_with_progress(
                                task_id,
                                TaskStatus::Merging,
                                "Download finished, merging formats...",
                                100,
                            )
                            .await;
                    }
                }
            }
            result = &mut handle => {
                result.map_err(|e| AppError::Download(format!("Task join error: {}", e)))??;
                break;
            }
        }
    }

    log::info!("Task {}: download finished in {}s", task_id, start_time.elapsed().as_secs());

    let source_path = find_downloaded_source(work_dir)?;
    let final_path = maybe_reencode(registry, task_id, quality_label, &source_path, work_dir).await?;

    match has_both_video_and_audio(&final_path).await {
        Ok(true) => {}
        Ok(false) => log::warn!("Task {}: output is missing a video or audio stream", task_id),
        Err(e) => log::warn!("Task {}: stream check failed: {}", task_id, e),
    }

    registry.complete(task_id, final_path, download_filename(&title)).await;
    log::info!("Task {}: finished in {}s total", task_id, start_time.elapsed().as_secs());
    Ok(())
}

/// Re-encodes the source down to the requested height when it is lower
/// than what was actually downloaded; otherwise hands the source through.
///
/// A failed height probe skips the re-encode instead of failing the task:
/// the user still gets the full-quality file.
async fn maybe_reencode(
    registry: &TaskRegistry,
    task_id: &str,
    quality_label: &str,
    source_path: &Path,
    work_dir: &Path,
) -> AppResult<PathBuf> {
    let requested_height = parse_quality_label(quality_label)
        .ok_or_else(|| AppError::Validation(format!("Unrecognized quality label: {}", quality_label)))?;

    let actual_height = match probe_video_height(source_path).await {
        Ok(height) => height,
        Err(e) => {
            log::warn!("Task {}: could not probe height ({}), skipping re-encode", task_id, e);
            return Ok(source_path.to_path_buf());
        }
    };

    if requested_height >= actual_height {
        log::debug!(
            "Task {}: requested {}p >= actual {}p, no re-encode needed",
            task_id,
            requested_height,
            actual_height
        );
        return Ok(source_path.to_path_buf());
    }

    registry
        .set_status_with_progress(
            task_id,
            TaskStatus::Reencoding,
            &format!("Re-encoding to {}...", quality_label),
            0,
        )
        .await;
    log::info!("🎞 Task {}: re-encoding {}p -> {}p", task_id, actual_height, requested_height);

    let final_path = work_dir.join("final_video.mp4");
    conversion::video::reencode_to_height(source_path, &final_path, requested_height).await?;

    Ok(final_path)
}
