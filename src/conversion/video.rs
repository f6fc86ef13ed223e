//! Video re-encoding.
//!
//! The download pipeline always fetches the best available streams and
//! merges them to MP4; when the user picked a lower quality than what was
//! actually available, the merged file is scaled down here.

use std::path::Path;
use tokio::process::Command;

use super::{ConversionError, ConversionResult};
use crate::core::process::FFMPEG_TIMEOUT;

/// ffmpeg filter/codec arguments for scaling a video down to `height`.
///
/// Width `-2` lets ffmpeg pick a matching even width, which keeps the
/// aspect ratio and satisfies yuv420p's even-dimension requirement.
/// Audio is copied untouched.
pub fn build_scale_args(height: u32) -> Vec<String> {
    vec![
        "-vf".to_string(),
        format!("scale=-2:{}", height),
        "-c:a".to_string(),
        "copy".to_string(),
    ]
}

/// Re-encode `input` down to the requested height, writing `output`.
///
/// # Arguments
/// * `input` - Merged source video (MP4 or MKV)
/// * `output` - Target path, overwritten if present
/// * `height` - Requested video height in pixels
pub async fn reencode_to_height<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    height: u32,
) -> ConversionResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(ConversionError::InputNotFound(input.display().to_string()));
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner").arg("-loglevel").arg("error").arg("-y");
    cmd.arg("-i").arg(input);
    cmd.args(build_scale_args(height));
    cmd.arg(output);

    log::info!(
        "Re-encoding {} -> {} at height {}",
        input.display(),
        output.display(),
        height
    );

    let result = tokio::time::timeout(FFMPEG_TIMEOUT, cmd.output()).await;

    let out = match result {
        Ok(out) => out?,
        Err(_) => {
            return Err(ConversionError::FfmpegError(format!(
                "ffmpeg timed out after {}s",
                FFMPEG_TIMEOUT.as_secs()
            )))
        }
    };

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        log::error!("FFmpeg re-encode error: {}", stderr.trim());
        return Err(ConversionError::FfmpegError(stderr.trim().to_string()));
    }

    if !output.exists() {
        return Err(ConversionError::OutputFailed(output.display().to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scale_args() {
        assert_eq!(build_scale_args(720), vec!["-vf", "scale=-2:720", "-c:a", "copy"]);
        assert_eq!(build_scale_args(144), vec!["-vf", "scale=-2:144", "-c:a", "copy"]);
    }

    #[tokio::test]
    async fn test_reencode_missing_input_is_rejected() {
        let result = reencode_to_height("/definitely/not/here.mp4", "/tmp/out.mp4", 480).await;
        assert!(matches!(result, Err(ConversionError::InputNotFound(_))));
    }
}
