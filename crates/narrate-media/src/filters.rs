//! FFmpeg video filter definitions.

use std::path::Path;

use narrate_models::EncodingConfig;

/// Letterbox-safe scale and pad into the output geometry.
///
/// The source keeps its aspect ratio and is centered on black bars, then the
/// sample aspect ratio and pixel format are forced so every segment matches.
pub fn normalize_filter(encoding: &EncodingConfig) -> String {
    let (w, h) = (encoding.width, encoding.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
         setsar=1,\
         format={pix}",
        pix = encoding.pixel_format
    )
}

/// Burn a SubRip track into the video.
pub fn subtitles_filter(srt_path: &Path, force_style: &str) -> String {
    let quoted_path = quote_filter_arg(&escape_filter_path(&srt_path.to_string_lossy()));
    if force_style.is_empty() {
        format!("subtitles={}", quoted_path)
    } else {
        format!(
            "subtitles={}:force_style='{}'",
            quoted_path,
            force_style.replace('\'', "")
        )
    }
}

/// Escape a path as a filter option value (`\`, `'` and `:`).
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\").replace('\'', "\\'").replace(':', "\\:")
}

/// Single-quote an option value for the filtergraph parser.
///
/// A quote cannot appear inside quotes, so each one closes the quoted run,
/// is escaped, and reopens it.
pub fn quote_filter_arg(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_normalize_filter() {
        assert_eq!(
            normalize_filter(&EncodingConfig::default()),
            "scale=1280:720:force_original_aspect_ratio=decrease,\
             pad=1280:720:(ow-iw)/2:(oh-ih)/2,setsar=1,format=yuv420p"
        );
    }

    #[test]
    fn test_normalize_filter_follows_geometry() {
        let filter = normalize_filter(&EncodingConfig::default().with_geometry(1080, 1920));
        assert!(filter.starts_with("scale=1080:1920:"));
        assert!(filter.contains("pad=1080:1920:"));
    }

    #[test]
    fn test_subtitles_filter() {
        let filter = subtitles_filter(Path::new("/tmp/narrate-x/captions.srt"), "FontSize=28");
        assert_eq!(
            filter,
            "subtitles='/tmp/narrate-x/captions.srt':force_style='FontSize=28'"
        );
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path(r"C:\work\it's.srt"), r"C\:\\work\\it\'s.srt");
    }

    #[test]
    fn test_subtitles_filter_with_quote_in_path() {
        let filter = subtitles_filter(Path::new("/tmp/it's/captions.srt"), "");
        assert_eq!(filter, r"subtitles='/tmp/it\'\''s/captions.srt'");
        assert_eq!(quote_filter_arg("plain"), "'plain'");
    }
}
