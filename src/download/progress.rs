//! yt-dlp progress line parsing.
//!
//! With `--newline` each progress update arrives as its own stdout line:
//!
//! ```text
//! [download]  45.2% of 10.55MiB at 1.23MiB/s ETA 00:05
//! [download] 100% of 10.55MiB in 00:12
//! [Merger] Merging formats into "/tmp/vydra/<task>/source_video.mp4"
//! ```
//!
//! Lines are stripped of ANSI escape sequences before parsing; yt-dlp
//! colors speed strings when it thinks it has a terminal.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static ANSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("ansi escape regex"));

/// Parsed snapshot of one `[download]` progress line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInfo {
    pub percent: u8,
    pub speed_mbs: Option<f64>,
    pub eta_seconds: Option<u64>,
    pub current_size: Option<u64>,
    pub total_size: Option<u64>,
}

/// What the download worker reports over its channel.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// A `[download]` line with a percentage
    Progress(ProgressInfo),
    /// yt-dlp started merging the video and audio streams
    Merging,
}

/// Removes ANSI color/style escape sequences from a line.
pub fn strip_ansi_codes(line: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(line, "")
}

/// Parses a yt-dlp `[download]` line into a [`ProgressInfo`].
///
/// Returns `None` for anything that is not a progress line (destination
/// announcements, fragment chatter, merger output).
pub fn parse_progress(line: &str) -> Option<ProgressInfo> {
    let line = strip_ansi_codes(line);

    if !line.contains("[download]") {
        return None;
    }

    // "[download] Destination: ..." and friends carry no percentage
    if !line.contains('%') {
        log::trace!("Download line without percent: {}", line);
        return None;
    }

    let mut percent = None;
    let mut speed_mbs = None;
    let mut eta_seconds = None;
    let mut current_size = None;
    let mut total_size = None;

    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if part.ends_with('%') {
            if let Ok(p) = part.trim_end_matches('%').parse::<f32>() {
                // Clamp so garbage input cannot report an early 100%
                let clamped = p.clamp(0.0, 100.0) as u8;
                percent = Some(clamped);
            }
        }

        // Total size: "of 10.00MiB" (or "of ~150.32MiB" while estimated)
        if *part == "of" && i + 1 < parts.len() {
            if let Some(size_bytes) = parse_size(parts[i + 1]) {
                total_size = Some(size_bytes);
            }
        }

        // Speed: "at 500.00KiB/s" or "at 2.3MiB/s"
        if *part == "at" && i + 1 < parts.len() {
            if let Some(speed) = parse_size(parts[i + 1]) {
                speed_mbs = Some(speed as f64 / (1024.0 * 1024.0));
            }
        }

        // ETA: "ETA 00:10" or "ETA 1:23"
        if *part == "ETA" && i + 1 < parts.len() {
            if let Some(eta) = parse_eta(parts[i + 1]) {
                eta_seconds = Some(eta);
            }
        }
    }

    let p = percent?;

    if let Some(total) = total_size {
        current_size = Some((total as f64 * (p as f64 / 100.0)) as u64);
    }

    Some(ProgressInfo {
        percent: p,
        speed_mbs,
        eta_seconds,
        current_size,
        total_size,
    })
}

/// Parses "10.00MiB" / "512.00KiB/s" / "~1.20GiB" into bytes.
fn parse_size(size_str: &str) -> Option<u64> {
    let size_str = size_str.trim_end_matches("/s");
    // yt-dlp prefixes estimated totals with a tilde
    let size_str = size_str.trim_start_matches('~');
    if size_str.ends_with("MiB") {
        if let Ok(mb) = size_str.trim_end_matches("MiB").parse::<f64>() {
            return Some((mb * 1024.0 * 1024.0) as u64);
        }
    } else if size_str.ends_with("KiB") {
        if let Ok(kb) = size_str.trim_end_matches("KiB").parse::<f64>() {
            return Some((kb * 1024.0) as u64);
        }
    } else if size_str.ends_with("GiB") {
        if let Ok(gb) = size_str.trim_end_matches("GiB").parse::<f64>() {
            return Some((gb * 1024.0 * 1024.0 * 1024.0) as u64);
        }
    }
    None
}

/// Parses an ETA like "00:10" or "1:23" into seconds.
fn parse_eta(eta_str: &str) -> Option<u64> {
    let parts: Vec<&str> = eta_str.split(':').collect();
    if parts.len() == 2 {
        if let (Ok(minutes), Ok(seconds)) = (parts[0].parse::<u64>(), parts[1].parse::<u64>()) {
            return Some(minutes * 60 + seconds);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_progress_standard_line() {
        let info = parse_progress("[download]  45.2% of 10.55MiB at 1.23MiB/s ETA 00:05");
        let info = info.expect("line should parse");
        assert_eq!(info.percent, 45);
        assert_eq!(info.eta_seconds, Some(5));
        assert_eq!(info.total_size, Some((10.55 * 1024.0 * 1024.0) as u64));
        assert!(info.speed_mbs.is_some());
        assert!(info.current_size.is_some());
    }

    #[test]
    fn test_parse_progress_finished_line() {
        let info = parse_progress("[download] 100% of 10.55MiB in 00:12").expect("line should parse");
        assert_eq!(info.percent, 100);
        assert_eq!(info.speed_mbs, None);
        assert_eq!(info.eta_seconds, None);
    }

    #[test]
    fn test_parse_progress_estimated_total() {
        let info = parse_progress("[download]   2.1% of ~150.32MiB at 512.00KiB/s ETA 04:55")
            .expect("line should parse");
        assert_eq!(info.percent, 2);
        assert_eq!(info.total_size, Some((150.32 * 1024.0 * 1024.0) as u64));
        assert_eq!(info.eta_seconds, Some(295));
    }

    #[test]
    fn test_parse_progress_ansi_colored_line() {
        let line = "\x1b[0;94m[download]\x1b[0m  45.2% of 10.55MiB at \x1b[32m1.23MiB/s\x1b[0m ETA 00:05";
        let info = parse_progress(line).expect("colored line should parse");
        assert_eq!(info.percent, 45);
        assert!(info.speed_mbs.is_some());
    }

    #[test]
    fn test_parse_progress_rejects_non_download_lines() {
        assert_eq!(parse_progress("[Merger] Merging formats into \"out.mp4\""), None);
        assert_eq!(parse_progress("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress(""), None);
    }

    #[test]
    fn test_parse_progress_rejects_lines_without_percent() {
        assert_eq!(parse_progress("[download] Destination: /tmp/source_video.mp4"), None);
        assert_eq!(parse_progress("[download] Resuming download at byte 12345"), None);
    }

    #[test]
    fn test_parse_progress_clamps_garbage_percent() {
        let info = parse_progress("[download] 250.0% of 10.00MiB").expect("line should parse");
        assert_eq!(info.percent, 100);
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("10.00MiB"), Some((10.0 * 1024.0 * 1024.0) as u64));
        assert_eq!(parse_size("512.00KiB"), Some((512.0 * 1024.0) as u64));
        assert_eq!(parse_size("1.50GiB"), Some((1.5 * 1024.0 * 1024.0 * 1024.0) as u64));
        assert_eq!(parse_size("2.3MiB/s"), Some((2.3 * 1024.0 * 1024.0) as u64));
        assert_eq!(parse_size("~99.90MiB"), Some((99.9 * 1024.0 * 1024.0) as u64));
        assert_eq!(parse_size("unknown"), None);
        assert_eq!(parse_size("10.00MB"), None);
    }

    #[test]
    fn test_parse_eta() {
        assert_eq!(parse_eta("00:10"), Some(10));
        assert_eq!(parse_eta("1:23"), Some(83));
        assert_eq!(parse_eta("04:55"), Some(295));
        assert_eq!(parse_eta("55"), None);
        assert_eq!(parse_eta("aa:bb"), None);
    }

    #[test]
    fn test_strip_ansi_codes_plain_passthrough() {
        assert_eq!(strip_ansi_codes("no colors here"), "no colors here");
        assert_eq!(strip_ansi_codes("\x1b[31mred\x1b[0m"), "red");
    }
}
