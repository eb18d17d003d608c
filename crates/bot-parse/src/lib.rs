#![deny(warnings)]

//! Parser for game-formatted quantity strings.
//!
//! The game displays large numbers with thousands separators and magnitude
//! words ("1.5 million", "2.3 sextillion cookies") or letter suffixes
//! ("3.4b"). `parse_quantity` converts any such string into an `f64`. The
//! function is total: malformed input yields `0.0`, never a panic or a
//! negative value.

/// Magnitude words, longest/most specific first so "sextillion" can never be
/// mistaken for a letter suffix.
const WORD_MAGNITUDES: &[(&str, f64)] = &[
    ("septillion", 1e24),
    ("sextillion", 1e21),
    ("quintillion", 1e18),
    ("quadrillion", 1e15),
    ("trillion", 1e12),
    ("billion", 1e9),
    ("million", 1e6),
];

/// Letter suffixes, checked only after the word forms. Two-letter suffixes
/// precede their one-letter prefixes ("qi" before "q").
const LETTER_MAGNITUDES: &[(&str, f64)] = &[
    ("sx", 1e21),
    ("qi", 1e18),
    ("q", 1e15),
    ("t", 1e12),
    ("b", 1e9),
    ("m", 1e6),
];

/// Parse a displayed quantity into a non-negative finite `f64`.
///
/// Normalization lowercases the input and strips whitespace and comma
/// separators. A magnitude suffix immediately following the leading numeric
/// part scales the value; anything after the matched suffix (trailing unit
/// words like "cookies") is discarded. When no suffix matches, the parser
/// falls back to collecting digits and dots from the whole string.
///
/// ```
/// assert_eq!(bot_parse::parse_quantity("1,234"), 1234.0);
/// assert_eq!(bot_parse::parse_quantity("1.5 million"), 1_500_000.0);
/// assert_eq!(bot_parse::parse_quantity("garbage"), 0.0);
/// ```
pub fn parse_quantity(text: &str) -> f64 {
    let normalized: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if normalized.is_empty() {
        return 0.0;
    }

    let split = normalized
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(normalized.len());
    let (head, tail) = normalized.split_at(split);

    // The leading-number path applies only when a magnitude suffix follows
    // it; everything else goes through the strip-and-parse fallback.
    if let Some(mult) = magnitude_of(tail) {
        if let Ok(value) = head.parse::<f64>() {
            return sanitize(value * mult);
        }
    }

    // Fallback: keep digits and dots from the whole string.
    let digits: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match digits.parse::<f64>() {
        Ok(v) => sanitize(v),
        Err(_) => 0.0,
    }
}

/// Multiplier implied by the alphabetic tail, `None` when none matches.
fn magnitude_of(tail: &str) -> Option<f64> {
    for (word, mult) in WORD_MAGNITUDES {
        if tail.starts_with(word) {
            return Some(*mult);
        }
    }
    for (letter, mult) in LETTER_MAGNITUDES {
        if tail.starts_with(letter) {
            return Some(*mult);
        }
    }
    None
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_integers_and_separators() {
        assert_eq!(parse_quantity("1,234"), 1234.0);
        assert_eq!(parse_quantity("12"), 12.0);
        assert_eq!(parse_quantity("  7  "), 7.0);
        assert_eq!(parse_quantity("1,234,567"), 1_234_567.0);
    }

    #[test]
    fn magnitude_words() {
        assert_eq!(parse_quantity("1.5 million"), 1_500_000.0);
        assert_eq!(parse_quantity("2 billion"), 2e9);
        assert_eq!(parse_quantity("3 trillion"), 3e12);
        assert_eq!(parse_quantity("1 quadrillion"), 1e15);
        assert_eq!(parse_quantity("1 quintillion"), 1e18);
        assert_eq!(parse_quantity("1 septillion"), 1e24);
    }

    #[test]
    fn trailing_unit_words_are_discarded() {
        assert_eq!(parse_quantity("2.3 sextillion cookies"), 2.3e21);
        assert_eq!(parse_quantity("1,234 cookies"), 1234.0);
        assert_eq!(parse_quantity("500 cookies per second"), 500.0);
    }

    #[test]
    fn letter_suffixes() {
        assert_eq!(parse_quantity("3.4b"), 3.4e9);
        assert_eq!(parse_quantity("2m"), 2e6);
        assert_eq!(parse_quantity("1.2t"), 1.2e12);
        assert_eq!(parse_quantity("5q"), 5e15);
        assert_eq!(parse_quantity("5qi"), 5e18);
        assert_eq!(parse_quantity("5sx"), 5e21);
    }

    #[test]
    fn word_wins_over_letter_prefix() {
        // "million" must not be read as the "m" suffix on "illion".
        assert_eq!(parse_quantity("4million"), 4e6);
        assert_eq!(parse_quantity("4 quintillion"), 4e18);
    }

    #[test]
    fn junk_between_digits_falls_back_to_stripping() {
        // Without a recognized suffix the whole string is stripped down to
        // its digits and dots, interleaved junk included.
        assert_eq!(parse_quantity("12abc34"), 1234.0);
        assert_eq!(parse_quantity("1x2x3"), 123.0);
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(parse_quantity(""), 0.0);
        assert_eq!(parse_quantity("abc"), 0.0);
        assert_eq!(parse_quantity("..."), 0.0);
        assert_eq!(parse_quantity("1.2.3"), 0.0);
        assert_eq!(parse_quantity("-"), 0.0);
    }

    #[test]
    fn minus_signs_are_not_quantities() {
        // Stock is never negative on screen; a stray minus is junk.
        assert_eq!(parse_quantity("-5"), 5.0);
    }

    proptest! {
        #[test]
        fn never_panics_and_stays_in_domain(s in "\\PC*") {
            let v = parse_quantity(&s);
            prop_assert!(v.is_finite());
            prop_assert!(v >= 0.0);
        }

        #[test]
        fn scales_word_suffixes(x in 0.0f64..999.0) {
            let text = format!("{x:.3} million");
            let parsed = parse_quantity(&text);
            let expected = format!("{x:.3}").parse::<f64>().unwrap() * 1e6;
            prop_assert!((parsed - expected).abs() <= expected * 1e-9 + 1e-6);
        }
    }
}
