use chrono::{DateTime, NaiveDate};

/// Parse an execution/expiration date as written in comps exports.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (date part kept), `MM/DD/YYYY`,
/// `YYYY/MM/DD`, `Mon D, YYYY`, and `Month D, YYYY`. Surrounding whitespace is
/// ignored. Returns `None` when nothing matches.
pub fn parse_execution_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y/%m/%d") {
        return Some(date);
    }
    parse_month_name_date(value)
}

/// Parse `Oct 15, 2024`, `Oct. 15, 2024`, or `October 15, 2024`.
fn parse_month_name_date(value: &str) -> Option<NaiveDate> {
    let mut tokens = value
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .filter(|token| !token.is_empty());
    let month = month_token_to_number(&tokens.next()?.to_ascii_lowercase())?;
    let day = tokens.next()?.parse::<u32>().ok()?;
    let year = tokens.next()?.parse::<i32>().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Convert a lowercase month token to a month number (1-12).
fn month_token_to_number(token: &str) -> Option<u32> {
    match token {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}
