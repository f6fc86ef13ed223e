//! yt-dlp failure classification.
//!
//! Maps raw yt-dlp stderr onto a small set of failure categories so the
//! API reports something a user can act on instead of a stack of extractor
//! internals. The raw stderr tail always goes to the log.

/// yt-dlp failure categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpErrorType {
    /// YouTube demands a signed-in session for this video
    AuthRequired,
    /// YouTube rejected the request as automated
    BotDetection,
    /// Video is private, removed or region-locked
    VideoUnavailable,
    /// Timeouts, DNS, connection resets
    NetworkError,
    /// Anything we could not classify
    Unknown,
}

/// Determines the failure category from yt-dlp stderr.
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("sign in to confirm you're not a bot")
        || stderr_lower.contains("please sign in")
        || stderr_lower.contains("sign in to confirm your age")
        || stderr_lower.contains("cookies are no longer valid")
        || stderr_lower.contains("use --cookies")
    {
        return YtDlpErrorType::AuthRequired;
    }

    if stderr_lower.contains("bot detection")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("unable to extract")
        || stderr_lower.contains("signature extraction failed")
    {
        return YtDlpErrorType::BotDetection;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("this video is not available")
        || stderr_lower.contains("video is private")
        || stderr_lower.contains("video has been removed")
        || stderr_lower.contains("this video does not exist")
        || stderr_lower.contains("video is not available")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("timeout")
        || stderr_lower.contains("timed out")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("socket")
        || stderr_lower.contains("dns")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// User-facing message for a failure category.
///
/// This string ends up in the task's `message` field and is shown in the
/// frontend, so it stays short and free of extractor jargon.
pub fn get_error_message(error_type: &YtDlpErrorType) -> String {
    match error_type {
        YtDlpErrorType::AuthRequired => {
            "YouTube requires a signed-in session for this video. Try another video.".to_string()
        }
        YtDlpErrorType::BotDetection => {
            "YouTube rejected the request. Try again in a few minutes.".to_string()
        }
        YtDlpErrorType::VideoUnavailable => {
            "Video unavailable. It may be private, removed or region-locked.".to_string()
        }
        YtDlpErrorType::NetworkError => "Network problem while downloading. Try again in a minute.".to_string(),
        YtDlpErrorType::Unknown => "Could not download the video. Check that the link is correct.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_auth_required() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: Sign in to confirm you're not a bot"),
            YtDlpErrorType::AuthRequired
        );
        assert_eq!(
            analyze_ytdlp_error("ERROR: This video requires login. Use --cookies for the authentication"),
            YtDlpErrorType::AuthRequired
        );
    }

    #[test]
    fn test_analyze_bot_detection() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: unable to download video data: HTTP Error 403: Forbidden"),
            YtDlpErrorType::BotDetection
        );
        assert_eq!(
            analyze_ytdlp_error("ERROR: Unable to extract player version"),
            YtDlpErrorType::BotDetection
        );
    }

    #[test]
    fn test_analyze_video_unavailable() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: [youtube] abc123: Video unavailable"),
            YtDlpErrorType::VideoUnavailable
        );
        assert_eq!(
            analyze_ytdlp_error("ERROR: [youtube] abc123: Private video. Sign in if you've been granted access"),
            YtDlpErrorType::VideoUnavailable
        );
    }

    #[test]
    fn test_analyze_network_error() {
        assert_eq!(
            analyze_ytdlp_error("ERROR: Unable to download webpage: The read operation timed out"),
            YtDlpErrorType::NetworkError
        );
        assert_eq!(
            analyze_ytdlp_error("ERROR: [youtube] Failed to connect to proxy"),
            YtDlpErrorType::NetworkError
        );
    }

    #[test]
    fn test_analyze_unknown() {
        assert_eq!(analyze_ytdlp_error(""), YtDlpErrorType::Unknown);
        assert_eq!(
            analyze_ytdlp_error("ERROR: something entirely new went wrong"),
            YtDlpErrorType::Unknown
        );
    }

    #[test]
    fn test_error_messages_are_user_safe() {
        for error_type in [
            YtDlpErrorType::AuthRequired,
            YtDlpErrorType::BotDetection,
            YtDlpErrorType::VideoUnavailable,
            YtDlpErrorType::NetworkError,
            YtDlpErrorType::Unknown,
        ] {
            let msg = get_error_message(&error_type);
            assert!(!msg.is_empty());
            assert!(!msg.to_lowercase().contains("stderr"));
            assert!(!msg.contains("ERROR:"));
        }
    }
}
