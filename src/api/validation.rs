use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Shown to clients whose URL is rejected.
pub const EXPECTED_URL_FORMAT: &str = "Invalid YouTube URL provided. Please enter a valid YouTube link \
     (e.g., https://www.youtube.com/watch?v=dQw4w9WgXcQ or https://youtu.be/dQw4w9WgXcQ).";

// Structural match only: optional scheme and www, one of two hosts, then the
// 11-char id either directly after the host or after watch?v=, embed/, v/ or a
// trailing v= query parameter. The id must not run into another id character.
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtube\.com|youtu\.be)/(?:watch\?v=|embed/|v/|\S+[?&]v=)?[A-Za-z0-9_-]{11}(?:[^A-Za-z0-9_\-\s]\S*)?$",
    )
    .expect("video url pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("url is empty")]
    Empty,
    #[error("url does not match a recognized video link")]
    Unrecognized,
}

/// Returns true if `url` looks like a single-video link.
pub fn is_valid_video_url(url: &str) -> bool {
    validate_video_url(url).is_ok()
}

pub fn validate_video_url(url: &str) -> Result<(), UrlValidationError> {
    if url.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if !VIDEO_URL.is_match(url) {
        return Err(UrlValidationError::Unrecognized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=AAAAAAAAAAA",
            "https://youtu.be/AAAAAAAAAAA",
            "youtube.com/embed/AAAAAAAAAAA",
            "http://youtube.com/v/dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/watch?feature=share&v=a-b_c-d_e-f",
        ] {
            assert!(is_valid_video_url(url), "expected accept: {url}");
        }
    }

    #[test]
    fn rejects_missing_identifier() {
        for url in [
            "not a url",
            "https://www.youtube.com/",
            "https://www.youtube.com/watch?v=short",
            "https://youtu.be/",
            "https://youtu.be/AAAAAAAAAA",
            "https://www.youtube.com/feedtrending",
            "https://example.com/watch?v=AAAAAAAAAAA",
            "ftp://youtube.com/watch?v=AAAAAAAAAAA",
            "https://youtube.com.evil.io/watch?v=AAAAAAAAAAA",
            "https://youtu.be/AAAAAAAAAAA rm -rf",
        ] {
            assert!(!is_valid_video_url(url), "expected reject: {url}");
        }
    }

    #[test]
    fn empty_input_is_its_own_error() {
        assert_eq!(validate_video_url(""), Err(UrlValidationError::Empty));
        assert_eq!(
            validate_video_url("nope"),
            Err(UrlValidationError::Unrecognized)
        );
    }
}
