use regex::Regex;

use crate::constants::defaults::ZERO_TEXT;
use crate::constants::patterns::GEO_POINT;
use crate::data::Coordinates;
use crate::errors::CompsError;

/// Keep only ASCII digits and periods (`"$1,200/mo"` -> `"1200"`).
pub fn numeric_chars(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect()
}

/// Parse a money field: strip to digits/periods, then read the leading float.
///
/// `"1.2.3"` reads as `1.2`. Empty or unparsable input yields `0.0`.
pub fn parse_money(text: &str) -> f64 {
    leading_float(&numeric_chars(text)).unwrap_or(0.0)
}

/// Parse a size field: strip to digits/periods, then read the leading integer.
///
/// `"2,500.75"` reads as `2500`. Empty or unparsable input yields `0`.
pub fn parse_size(text: &str) -> u64 {
    let stripped = numeric_chars(text);
    let digits: &str = stripped
        .find(|ch: char| !ch.is_ascii_digit())
        .map_or(stripped.as_str(), |end| &stripped[..end]);
    digits.parse::<u64>().unwrap_or(0)
}

/// Strip a numeric-looking field to digits/periods, keeping it as text.
///
/// Empty results become `"0"`.
pub fn numeric_text(text: &str) -> String {
    let stripped = numeric_chars(text);
    if stripped.is_empty() {
        ZERO_TEXT.to_string()
    } else {
        stripped
    }
}

/// Return `text`, or `fallback` when it is empty.
pub fn text_or(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

/// Read the longest leading `[-+]?digits[.digits]` prefix as a float.
///
/// Requires at least one digit; anything after the prefix is ignored.
pub fn leading_float(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Extractor for `(lat, lng)` geo point text.
#[derive(Clone, Debug)]
pub struct GeoPointExtractor {
    pattern: Regex,
}

impl GeoPointExtractor {
    /// Compile the geo point pattern.
    pub fn new() -> Result<Self, CompsError> {
        let pattern = Regex::new(GEO_POINT)
            .map_err(|err| CompsError::Parse(format!("invalid geo point pattern: {err}")))?;
        Ok(Self { pattern })
    }

    /// Extract the first `(lat, lng)` pair in `text`.
    ///
    /// Returns `None` when no pair is present or either capture has no digits.
    pub fn extract(&self, text: &str) -> Option<Coordinates> {
        let caps = self.pattern.captures(text)?;
        Some(Coordinates::new(
            leading_float(caps.get(1)?.as_str())?,
            leading_float(caps.get(2)?.as_str())?,
        ))
    }

    /// Rejoin a geo point that the comma tokenizer split in two.
    ///
    /// `head` and `tail` are adjacent tokens such as `(40.7128` and
    /// `-74.0060)`. The joined text must be exactly one `(lat, lng)` pair, so
    /// a pair embedded in other text never matches.
    pub fn extract_split(&self, head: &str, tail: &str) -> Option<Coordinates> {
        if !head.starts_with('(') || !tail.ends_with(')') {
            return None;
        }
        let joined = format!("{head},{tail}");
        let caps = self.pattern.captures(&joined)?;
        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != joined.len() {
            return None;
        }
        Some(Coordinates::new(
            leading_float(caps.get(1)?.as_str())?,
            leading_float(caps.get(2)?.as_str())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_strips_symbols_and_separators() {
        assert_eq!(parse_money("$1,200/mo"), 1200.0);
        assert_eq!(parse_money("85"), 85.0);
        assert_eq!(parse_money("$42.50"), 42.5);
        assert_eq!(parse_money("1.2.3"), 1.2);
        assert_eq!(parse_money(""), 0.0);
        assert_eq!(parse_money("n/a"), 0.0);
        assert_eq!(parse_money("."), 0.0);
    }

    #[test]
    fn size_reads_leading_integer() {
        assert_eq!(parse_size("25000"), 25000);
        assert_eq!(parse_size("2,500.75 SF"), 2500);
        assert_eq!(parse_size(""), 0);
        assert_eq!(parse_size(".5"), 0);
        assert_eq!(parse_size("approx"), 0);
    }

    #[test]
    fn numeric_text_defaults_to_zero_string() {
        assert_eq!(numeric_text("$1,500,000"), "1500000");
        assert_eq!(numeric_text("$80.25"), "80.25");
        assert_eq!(numeric_text(""), "0");
        assert_eq!(numeric_text("TBD"), "0");
    }

    #[test]
    fn leading_float_handles_signs_and_trailing_dot() {
        assert_eq!(leading_float("-74.0060"), Some(-74.006));
        assert_eq!(leading_float("+3"), Some(3.0));
        assert_eq!(leading_float("7."), Some(7.0));
        assert_eq!(leading_float(".25"), Some(0.25));
        assert_eq!(leading_float("-"), None);
        assert_eq!(leading_float("--1"), None);
        assert_eq!(leading_float(""), None);
    }

    #[test]
    fn geo_point_extracts_lat_then_lng() {
        let geo = GeoPointExtractor::new().unwrap();
        assert_eq!(
            geo.extract("(40.7128, -74.0060)"),
            Some(Coordinates::new(40.7128, -74.006))
        );
        assert_eq!(
            geo.extract("(40.7128,-74.0060)"),
            Some(Coordinates::new(40.7128, -74.006))
        );
        assert_eq!(geo.extract("(0, 0)"), Some(Coordinates::new(0.0, 0.0)));
        assert_eq!(geo.extract("40.7128, -74.0060"), None);
        assert_eq!(geo.extract("(-, -)"), None);
        assert_eq!(geo.extract(""), None);
    }

    #[test]
    fn split_geo_point_rejoins_only_exact_pairs() {
        let geo = GeoPointExtractor::new().unwrap();
        assert_eq!(
            geo.extract_split("(40.7128", "-74.0060)"),
            Some(Coordinates::new(40.7128, -74.006))
        );
        assert_eq!(geo.extract_split("(1", " 2)"), Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(geo.extract_split("Suite (1, 2) near park", ""), None);
        assert_eq!(geo.extract_split("Acme", ""), None);
        assert_eq!(geo.extract_split("(1", "2) and (3, 4)"), None);
        assert_eq!(geo.extract_split("(abc", "def)"), None);
    }
}
