//! Media conversion via ffmpeg.
//!
//! A downloaded video is served as-is when the user asked for the quality
//! it was fetched at, and re-encoded down to the requested height otherwise.
//! ffprobe availability is checked here too since the download pipeline
//! uses it to decide whether a re-encode is needed.

pub mod video;

use thiserror::Error;

use crate::core::process::VERSION_CHECK_TIMEOUT;

/// Errors that can occur during conversion
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Output creation failed: {0}")]
    OutputFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ConversionResult<T> = Result<T, ConversionError>;

/// Check if ffmpeg is available
pub async fn check_ffmpeg() -> bool {
    version_probe("ffmpeg").await.is_some()
}

/// Check if ffprobe is available
pub async fn check_ffprobe() -> bool {
    version_probe("ffprobe").await.is_some()
}

/// ffmpeg version string, e.g. "7.1"
pub async fn ffmpeg_version() -> ConversionResult<String> {
    match version_probe("ffmpeg").await {
        Some(version) => Ok(version),
        None => Err(ConversionError::FfmpegError(
            "ffmpeg is not installed or not on PATH".to_string(),
        )),
    }
}

/// Runs `<bin> -version` and extracts the version token from the first line.
async fn version_probe(bin: &str) -> Option<String> {
    let output = tokio::time::timeout(
        VERSION_CHECK_TIMEOUT,
        tokio::process::Command::new(bin).arg("-version").output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    // First line looks like "ffmpeg version 7.1 Copyright ..."
    let first_line = stdout.lines().next()?;
    let version = first_line.split_whitespace().nth(2).unwrap_or("unknown");
    Some(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::FfmpegError("boom".to_string());
        assert_eq!(err.to_string(), "FFmpeg error: boom");

        let err = ConversionError::InputNotFound("/tmp/nope.mp4".to_string());
        assert_eq!(err.to_string(), "Input file not found: /tmp/nope.mp4");
    }
}
