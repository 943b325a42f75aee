//! Path utilities for detecting file types by extension.
//!
//! Used by the scanner to filter discovered files and by stream negotiation
//! for the direct-play MIME hint.

use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use scenevault_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.mp4")));
/// assert!(!is_video_file(Path::new("cover.jpg")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    file_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Get the lowercased file extension of a path, if any.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use scenevault_common::paths::file_extension;
///
/// assert_eq!(file_extension(Path::new("Movie.MKV")), Some("mkv".to_string()));
/// assert_eq!(file_extension(Path::new("noext")), None);
/// ```
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
