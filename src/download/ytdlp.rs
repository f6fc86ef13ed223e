//! yt-dlp binary checks.

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::process::VERSION_CHECK_TIMEOUT;

/// Returns the installed yt-dlp version, e.g. "2025.08.11".
///
/// The binary comes from `config::YTDL_BIN`. Runs under a short timeout so
/// a broken install cannot hang startup diagnostics.
pub async fn ytdlp_version() -> AppResult<String> {
    let ytdl_bin = &*config::YTDL_BIN;

    let output = timeout(VERSION_CHECK_TIMEOUT, Command::new(ytdl_bin).arg("--version").output())
        .await
        .map_err(|_| AppError::Download("yt-dlp --version timed out".to_string()))?
        .map_err(|e| AppError::Download(format!("Failed to run {}: {}", ytdl_bin, e)))?;

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if !output.status.success() || version.is_empty() {
        return Err(AppError::Download(
            "yt-dlp is not installed or --version produced no output".to_string(),
        ));
    }

    Ok(version)
}

/// Check if yt-dlp is runnable
pub async fn check_ytdlp() -> bool {
    ytdlp_version().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_check_ytdlp_agrees_with_version_probe() {
        // Holds whether or not yt-dlp is installed on this machine
        assert_eq!(check_ytdlp().await, ytdlp_version().await.is_ok());
    }
}
