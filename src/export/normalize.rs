//! Identifier-safe property names
//!
//! Display names from the source can carry accents, spaces and punctuation.
//! Normalization strips diacritics and collapses everything outside
//! `[A-Za-z0-9_]` so the resulting keys work with dot-notation access.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_]+").unwrap()
});

/// Normalize a display name into an identifier-safe key.
///
/// Returns the input untouched when `enabled` is false or the input is
/// blank. Idempotent: normalizing a normalized key yields the same key.
pub fn normalize(name: &str, enabled: bool) -> Cow<'_, str> {
    if !enabled || name.trim().is_empty() {
        return Cow::Borrowed(name);
    }

    let stripped: String = strip_diacritics(name);
    let collapsed = NON_IDENTIFIER_REGEX.replace_all(&stripped, "_");

    let starts_with_digit = collapsed
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit());

    if starts_with_digit {
        Cow::Owned(format!("_{}", collapsed))
    } else {
        Cow::Owned(collapsed.into_owned())
    }
}

/// Decompose, drop combining marks, recompose
fn strip_diacritics(name: &str) -> String {
    name.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_passthrough() {
        assert_eq!(normalize("Städer och län", false), "Städer och län");
        assert!(matches!(normalize("Städer", false), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Ädress", true), "Adress");
        assert_eq!(normalize("Städer", true), "Stader");
        assert_eq!(normalize("Crème brûlée", true), "Creme_brulee");
    }

    #[test]
    fn test_collapses_runs() {
        assert_eq!(normalize("first  name", true), "first_name");
        assert_eq!(normalize("a - b / c", true), "a_b_c");
        assert_eq!(normalize("price (€)", true), "price_");
        assert_eq!(normalize("keep_underscores", true), "keep_underscores");
        assert_eq!(normalize("dotted.name", true), "dotted_name");
    }

    #[test]
    fn test_leading_digit_prefixed() {
        assert_eq!(normalize("2020 sales", true), "_2020_sales");
        assert_eq!(normalize("_2020_sales", true), "_2020_sales");
    }

    #[test]
    fn test_blank_unchanged() {
        assert_eq!(normalize("", true), "");
        assert_eq!(normalize("   ", true), "   ");
    }

    #[test]
    fn test_never_fails_on_symbols() {
        assert_eq!(normalize("日本語", true), "_");
        assert_eq!(normalize("?!", true), "_");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Ädress",
            "first  name",
            "2020 sales",
            "  padded  ",
            "日本語 tabell",
            "Ω-ratio",
            "already_ok",
            "",
            "   ",
            "ﬁle",
        ];

        for sample in samples {
            let once = normalize(sample, true).into_owned();
            let twice = normalize(&once, true).into_owned();
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }
}
