//! Internal helpers for input normalization.

use unicode_normalization::UnicodeNormalization;

/// Trim and NFC-normalize free text; blank input becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

/// Trim and NFC-normalize an identifier; blank input becomes `None`.
pub(crate) fn normalize_id(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(normalize_optional_text(Some(" rent ")), Some("rent".to_string()));
    }

    #[test]
    fn text_is_composed() {
        // "e" + combining acute accent
        let decomposed = "caff\u{0065}\u{0301}";
        assert_eq!(
            normalize_optional_text(Some(decomposed)),
            Some("caff\u{00e9}".to_string())
        );
    }

    #[test]
    fn ids_are_trimmed_and_composed() {
        assert_eq!(normalize_id("  "), None);
        assert_eq!(normalize_id(" acct-1 "), Some("acct-1".to_string()));
        assert_eq!(
            normalize_id("ren\u{0065}\u{0301}"),
            Some("ren\u{00e9}".to_string())
        );
    }
}
