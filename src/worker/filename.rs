//! Output filename derivation

use std::path::{Path, PathBuf};

use uuid::Uuid;

const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FALLBACK_TITLE: &str = "video";

/// Byte budget for the title part of a file name. Leaves room for the
/// `_<32 hex>.<ext>` suffix under the common 255-byte name limit.
pub const MAX_TITLE_BYTES: usize = 180;

/// Replaces filesystem-unsafe characters and control characters with `_`,
/// escapes `%` so the extractor does not expand it as a template field, and
/// truncates to [`MAX_TITLE_BYTES`] on a character boundary.
pub fn sanitize_title(title: &str) -> String {
    let mut cleaned = String::new();
    let mut buf = [0; 4];
    for c in title.trim().chars() {
        let piece: &str = match c {
            '%' => "%%",
            c if UNSAFE_CHARS.contains(&c) || c.is_control() => "_",
            _ => c.encode_utf8(&mut buf),
        };
        if cleaned.len() + piece.len() > MAX_TITLE_BYTES {
            break;
        }
        cleaned.push_str(piece);
    }

    // "." and ".." would resolve to directories
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_TITLE.to_string()
    } else {
        cleaned
    }
}

/// `<dir>/<sanitized title>_<random hex>.%(ext)s`
pub fn output_template(download_dir: &Path, title: &str) -> PathBuf {
    let suffix = Uuid::new_v4().simple();
    download_dir.join(format!("{}_{}.%(ext)s", sanitize_title(title), suffix))
}
