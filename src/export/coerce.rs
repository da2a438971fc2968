use crate::types::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;

// 2^53; every integer up to this magnitude is an exact double
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// Optional minus, no leading zeros, at most one decimal separator, no exponent
static NUMERIC_LITERAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)([.,][0-9]*)?$").unwrap()
});

/// Reinterpret a number-looking string as a number.
///
/// Only `Text` values are candidates, and only when the whole string matches
/// the numeric literal grammar. Anything else comes back unchanged.
pub fn coerce(value: FieldValue, enabled: bool) -> FieldValue {
    if !enabled {
        return value;
    }

    match value {
        FieldValue::Text(text) => match parse_numeric_literal(&text) {
            Some(number) => number,
            None => FieldValue::Text(text),
        },
        other => other,
    }
}

/// Parse a numeric literal, `None` when the string is not one.
///
/// The literal is read as a double, with `,` accepted as the decimal point.
/// Separator-free literals whose double value is a whole number within
/// +/-2^53 are handed back as `Int`, which writes the same number without a
/// trailing `.0`. `-0` stays a double so its sign survives.
pub fn parse_numeric_literal(text: &str) -> Option<FieldValue> {
    if !NUMERIC_LITERAL_REGEX.is_match(text) {
        return None;
    }

    let number = text.replace(',', ".").parse::<f64>().ok()?;

    let has_separator = text.contains(['.', ',']);
    let negative_zero = number == 0.0 && number.is_sign_negative();
    if !has_separator && !negative_zero && number.abs() <= MAX_EXACT_INTEGER {
        return Some(FieldValue::Int(number as i64));
    }

    Some(FieldValue::Float(number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce(text("42"), true), FieldValue::Int(42));
        assert_eq!(coerce(text("-7"), true), FieldValue::Int(-7));
        assert_eq!(coerce(text("0"), true), FieldValue::Int(0));
    }

    #[test]
    fn test_decimals() {
        assert_eq!(coerce(text("2,75"), true), FieldValue::Float(2.75));
        assert_eq!(coerce(text("2.75"), true), FieldValue::Float(2.75));
        assert_eq!(coerce(text("-0.5"), true), FieldValue::Float(-0.5));
        assert_eq!(coerce(text("12."), true), FieldValue::Float(12.0));
    }

    #[test]
    fn test_huge_integer_falls_back_to_double() {
        assert_eq!(
            coerce(text("123456789012345678901234567890"), true),
            FieldValue::Float(1.2345678901234568e29)
        );
    }

    #[test]
    fn test_integers_follow_double_precision() {
        assert_eq!(
            coerce(text("9007199254740992"), true),
            FieldValue::Int(9_007_199_254_740_992)
        );
        // Not representable as a double; rounds like any other parsed double
        assert_eq!(
            coerce(text("9007199254740993"), true),
            FieldValue::Int(9_007_199_254_740_992)
        );
        assert_eq!(
            coerce(text("-9007199254740994"), true),
            FieldValue::Float(-9_007_199_254_740_994.0)
        );
    }

    #[test]
    fn test_negative_zero_keeps_sign() {
        match coerce(text("-0"), true) {
            FieldValue::Float(f) => assert!(f == 0.0 && f.is_sign_negative()),
            other => panic!("expected negative zero, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_forms() {
        for s in [
            "abc", "1e10", "+5", "007", "1.000,5", "1,2,3", "1 000", "", "-", ".5", " 42", "42 ",
        ] {
            assert_eq!(coerce(text(s), true), text(s), "{:?} should not coerce", s);
        }
    }

    #[test]
    fn test_disabled_passthrough() {
        assert_eq!(coerce(text("42"), false), text("42"));
        assert_eq!(coerce(FieldValue::Null, false), FieldValue::Null);
    }

    #[test]
    fn test_non_text_untouched() {
        assert_eq!(coerce(FieldValue::Int(5), true), FieldValue::Int(5));
        assert_eq!(coerce(FieldValue::Bool(true), true), FieldValue::Bool(true));
        assert_eq!(coerce(FieldValue::Null, true), FieldValue::Null);
        assert_eq!(
            coerce(FieldValue::Binary(b"42".to_vec()), true),
            FieldValue::Binary(b"42".to_vec())
        );
    }
}
