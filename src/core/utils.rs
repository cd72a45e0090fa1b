use std::path::Path;

/// Extensions treated as downloadable media (audio or video).
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "mov", "avi", "flv", "m4v", "ts", "m4a", "mp3", "opus", "ogg", "oga", "flac", "wav", "aac",
    "alac", "wma",
];

/// Extensions of subtitle files the downloader may leave behind.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["vtt", "srt", "ass", "lrc"];

/// Extensions of thumbnails written by `--write-thumbnail`.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Makes an arbitrary title safe to use as a file or directory name.
///
/// Replaced characters:
/// - `/` and `\` -> `_` (path separators)
/// - `:` `*` `?` `<` `>` `|` -> `_` (reserved on Windows)
/// - `"` -> `'`
/// - control characters -> `_`
///
/// Leading and trailing whitespace and dots are trimmed. An empty result
/// becomes `unnamed`.
///
/// # Example
///
/// ```
/// use vidarc::core::utils::escape_filename;
///
/// let safe = escape_filename("AC/DC - Back In Black (1980) [OLAK5uy]");
/// assert_eq!(safe, "AC_DC - Back In Black (1980) [OLAK5uy]");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}

/// Lowercased extension of a path, without the dot.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase())
}

/// Whether the path has one of the known media extensions.
pub fn is_media_file(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether the path has one of the known subtitle extensions.
pub fn is_subtitle_file(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| SUBTITLE_EXTENSIONS.contains(&ext.as_str()))
}

/// Removes a trailing yt-dlp format id (`.f137`) from a file stem.
///
/// Separate video and audio streams are announced as `Title.f137.mp4` and
/// `Title.f251.webm`; the sidecars are named after the plain `Title`.
pub fn strip_format_suffix(stem: &str) -> &str {
    if let Some(dot) = stem.rfind('.') {
        let suffix = &stem[dot + 1..];
        if suffix.len() > 1 && suffix.starts_with('f') && suffix[1..].chars().all(|c| c.is_ascii_digit()) {
            return &stem[..dot];
        }
    }
    stem
}

/// Final path component as a lossy string.
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_escape_filename() {
        assert_eq!(
            escape_filename("AC/DC - Live: 1991 [OLAK5uy_x]"),
            "AC_DC - Live_ 1991 [OLAK5uy_x]"
        );
        assert_eq!(escape_filename("Who? What? (2003) [PLab|cd]"), "Who_ What_ (2003) [PLab_cd]");
        assert_eq!(escape_filename("The \"Blue\" Album (1994)"), "The 'Blue' Album (1994)");
        assert_eq!(escape_filename("Split\tTitle\n[id]"), "Split_Title_[id]");
        assert_eq!(escape_filename("  Record (2001) [a1]. "), "Record (2001) [a1]");
        assert_eq!(escape_filename("..."), "unnamed");
        assert_eq!(escape_filename(""), "unnamed");
        assert_eq!(escape_filename("Сборник <Лучшее> [x*y]"), "Сборник _Лучшее_ [x_y]");
    }

    #[test]
    fn test_media_detection_is_case_insensitive() {
        assert!(is_media_file(&PathBuf::from("a/Clip.MP4")));
        assert!(is_media_file(&PathBuf::from("01. Track [id].opus")));
        assert!(!is_media_file(&PathBuf::from("Clip.info.json")));
        assert!(!is_media_file(&PathBuf::from("Clip")));
        assert!(is_subtitle_file(&PathBuf::from("Clip.en.vtt")));
    }

    #[test]
    fn test_strip_format_suffix() {
        assert_eq!(strip_format_suffix("Title.f137"), "Title");
        assert_eq!(strip_format_suffix("Title (2020).f251"), "Title (2020)");
        assert_eq!(strip_format_suffix("Title.final"), "Title.final");
        assert_eq!(strip_format_suffix("Title.f"), "Title.f");
        assert_eq!(strip_format_suffix("Title"), "Title");
    }
}
