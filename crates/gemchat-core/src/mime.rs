//! Content-type resolution for uploaded files.

use std::path::Path;

/// Returned when neither the table nor `mime_guess` knows the extension.
pub const FALLBACK_MIME: &str = "text/plain";

const OCTET_STREAM: &str = "application/octet-stream";

/// Types the Gemini API accepts for the extensions users upload most often.
///
/// Checked before `mime_guess` because the generic database maps some of
/// these differently (`.ts` is MPEG transport stream there, source code here).
fn table_lookup(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "html" => "text/html",
        "css" => "text/css",
        "js" | "ts" => "text/javascript",
        "json" | "ipynb" => "application/json",
        "xml" => "application/xml",
        "py" => "text/x-python",
        "c" => "text/x-c",
        "cpp" => "text/x-c++",
        "java" => "text/x-java",
        "r" => "text/x-r",
        "sql" => "text/x-sql",
        "sh" => "text/x-sh",
        "yaml" | "yml" => "text/yaml",
        "tex" => "text/x-tex",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime)
}

/// Resolve the content type for `path` from its extension.
///
/// Lookup order: the fixed table, then `mime_guess`, then [`FALLBACK_MIME`].
/// A generic `application/octet-stream` guess also falls back, so the
/// provider treats unknown files as text rather than rejecting them.
pub fn resolve_mime(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if let Some(mime) = ext.as_deref().and_then(table_lookup) {
        return mime.to_owned();
    }

    match mime_guess::from_path(path).first() {
        Some(guess) if guess.essence_str() != OCTET_STREAM => guess.essence_str().to_owned(),
        _ => FALLBACK_MIME.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_wins_over_generic_guess() {
        assert_eq!(resolve_mime("main.ts"), "text/javascript");
        assert_eq!(resolve_mime("notebook.ipynb"), "application/json");
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(resolve_mime("SCAN.PDF"), "application/pdf");
        assert_eq!(resolve_mime("photo.JpEg"), "image/jpeg");
    }

    #[test]
    fn office_formats_resolve() {
        assert!(resolve_mime("report.docx").contains("wordprocessingml"));
        assert!(resolve_mime("sheet.xlsx").contains("spreadsheetml"));
    }

    #[test]
    fn falls_through_to_mime_guess() {
        assert_eq!(resolve_mime("icon.svg"), "image/svg+xml");
    }

    #[test]
    fn unknown_or_missing_extension_defaults_to_text() {
        assert_eq!(resolve_mime("Makefile"), FALLBACK_MIME);
        assert_eq!(resolve_mime("data.zz-unknown"), FALLBACK_MIME);
    }

    #[test]
    fn octet_stream_guess_defaults_to_text() {
        assert_eq!(resolve_mime("firmware.bin"), FALLBACK_MIME);
    }
}
