/// Reduces a video title to a filename-safe form.
///
/// Keeps only alphanumeric characters (any script), spaces and dashes,
/// dropping everything else, then trims trailing whitespace. Falls back
/// to `"video"` when nothing survives the filter, so the download header
/// never carries an empty name.
///
/// # Example
///
/// ```
/// use vydra::core::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("Rust in 100 Seconds (2024) [4K]"), "Rust in 100 Seconds 2024 4K");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let mut result = String::with_capacity(title.len());

    for c in title.chars() {
        match c {
            c if c.is_alphanumeric() => result.push(c),
            ' ' | '-' => result.push(c),
            _ => {}
        }
    }

    let result = result.trim_end();

    if result.is_empty() {
        "video".to_string()
    } else {
        result.to_string()
    }
}

/// Filename offered to the browser for a completed download.
pub fn download_filename(title: &str) -> String {
    format!("{}.mp4", sanitize_title(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_title_strips_punctuation() {
        assert_eq!(sanitize_title("Hello, World!"), "Hello World");
        assert_eq!(sanitize_title("a/b\\c:d*e"), "abcde");
    }

    #[test]
    fn test_sanitize_title_keeps_spaces_and_dashes() {
        assert_eq!(sanitize_title("My Video - Part 2"), "My Video - Part 2");
    }

    #[test]
    fn test_sanitize_title_trims_trailing_whitespace() {
        assert_eq!(sanitize_title("Trailing... "), "Trailing");
        assert_eq!(sanitize_title("Dots..."), "Dots");
    }

    #[test]
    fn test_sanitize_title_unicode_letters_survive() {
        assert_eq!(sanitize_title("Выдра играет 🦦"), "Выдра играет");
    }

    #[test]
    fn test_sanitize_title_empty_falls_back() {
        assert_eq!(sanitize_title(""), "video");
        assert_eq!(sanitize_title("!!!"), "video");
    }

    #[test]
    fn test_download_filename_appends_extension() {
        assert_eq!(download_filename("Some Clip"), "Some Clip.mp4");
        assert_eq!(download_filename("???"), "video.mp4");
    }
}
