use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration constants for the service
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Base directory for per-task working directories
/// Read from TEMP_FILES_DIR environment variable
/// Each download task gets its own subdirectory named after the task id,
/// removed when the file is served, when the task errors, or by the janitor.
/// Supports tilde (~) expansion via [`work_dir`].
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp/vydra".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: vydra.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "vydra.log".to_string()));

/// Host the HTTP server binds to
/// Read from WEB_HOST environment variable
/// Default: 0.0.0.0
pub static WEB_HOST: Lazy<String> = Lazy::new(|| env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server binds to
/// Read from WEB_PORT environment variable, unparsable values fall back
/// Default: 8000
pub static WEB_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000)
});

/// Origins allowed to call the API from a browser
/// Read from CORS_ALLOWED_ORIGINS environment variable (comma-separated)
/// Default: http://localhost:3000 (a separately hosted frontend dev server)
pub static CORS_ALLOWED_ORIGINS: Lazy<Vec<String>> = Lazy::new(|| {
    env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
});

/// Resolved base working directory with tilde expansion applied.
pub fn work_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde(&*TEMP_FILES_DIR).to_string())
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp metadata commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240; // 4 minutes, slow extractors need it

    /// Socket timeout passed to yt-dlp (in seconds)
    pub const SOCKET_TIMEOUT_SECS: u64 = 30;

    /// Main-request retries passed to yt-dlp
    pub const RETRIES: u32 = 10;

    /// Fragment retries passed to yt-dlp
    pub const FRAGMENT_RETRIES: u32 = 10;

    /// yt-dlp command timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Task registry cleanup configuration
pub mod cleanup {
    use super::Duration;

    /// How long a finished or failed task stays queryable before the
    /// janitor drops it together with its working directory (in seconds)
    pub const TASK_TTL_SECS: u64 = 3600; // 1 hour

    /// Interval between janitor sweeps (in seconds)
    pub const CHECK_INTERVAL_SECS: u64 = 300;

    /// Stale-task TTL duration
    pub fn task_ttl() -> Duration {
        Duration::from_secs(TASK_TTL_SECS)
    }

    /// Janitor sweep interval duration
    pub fn check_interval() -> Duration {
        Duration::from_secs(CHECK_INTERVAL_SECS)
    }
}
