//! Line-separator preserving round trip.
//!
//! Text is edited LF-normalized. The separator found in the loaded text is
//! remembered and only reapplied when the text is serialized back out.

use crate::types::LineSeparator;

/// Detect the separator style from the first newline in `text`.
///
/// A `\n` preceded by `\r` means CRLF, any other `\n` means LF. Text without
/// newlines yields `default`.
pub fn detect_separator(text: &str, default: LineSeparator) -> LineSeparator {
    match text.find('\n') {
        Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => LineSeparator::Crlf,
        Some(_) => LineSeparator::Lf,
        None => default,
    }
}

/// Convert every CRLF to LF for editing.
///
/// Lone `\r` characters are left alone.
pub fn normalize(text: &str) -> String {
    if text.contains("\r\n") {
        text.replace("\r\n", "\n")
    } else {
        text.to_owned()
    }
}

/// Rewrite LF-normalized `text` with `separator` for serialization.
pub fn materialize(text: &str, separator: LineSeparator) -> String {
    match separator {
        LineSeparator::Lf => text.to_owned(),
        LineSeparator::Crlf => text.replace('\n', "\r\n"),
    }
}

/// Detect the separator and normalize in one step, as done on load.
pub fn detect_and_normalize(text: &str, default: LineSeparator) -> (String, LineSeparator) {
    (normalize(text), detect_separator(text, default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(detect_separator("a\r\nb", LineSeparator::Lf), LineSeparator::Crlf);
        assert_eq!(detect_separator("a\nb\r\nc", LineSeparator::Crlf), LineSeparator::Lf);
        assert_eq!(detect_separator("\nb", LineSeparator::Crlf), LineSeparator::Lf);
        assert_eq!(detect_separator("single", LineSeparator::Crlf), LineSeparator::Crlf);
        assert_eq!(detect_separator("", LineSeparator::Lf), LineSeparator::Lf);
    }

    #[test]
    fn test_crlf_round_trip() {
        let original = "# Title\r\n\r\nBody\r\n";
        let (edited, sep) = detect_and_normalize(original, LineSeparator::Lf);

        assert_eq!(sep, LineSeparator::Crlf);
        assert_eq!(edited, "# Title\n\nBody\n");
        assert_eq!(materialize(&edited, sep), original);
    }

    #[test]
    fn test_lf_round_trip() {
        let original = "one\ntwo\n";
        let (edited, sep) = detect_and_normalize(original, LineSeparator::Crlf);

        assert_eq!(sep, LineSeparator::Lf);
        assert_eq!(materialize(&edited, sep), original);
    }

    #[test]
    fn test_materialize_idempotent_through_normalize() {
        for sep in [LineSeparator::Lf, LineSeparator::Crlf] {
            let once = materialize("a\nb\n\nc", sep);
            let (normalized, detected) = detect_and_normalize(&once, LineSeparator::Lf);
            assert_eq!(detected, sep);
            assert_eq!(materialize(&normalized, sep), once);
        }
    }

    #[test]
    fn test_edit_then_serialize() {
        let (_, sep) = detect_and_normalize("a\r\nb", LineSeparator::Lf);
        assert_eq!(materialize("a\nb\nc", sep), "a\r\nb\r\nc");
    }
}
