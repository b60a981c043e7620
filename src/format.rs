use crate::constants::format::{FILE_SIZE_STEP, FILE_SIZE_UNITS, MISSING_VALUE};

/// Render a dollar amount rounded to whole dollars, e.g. `$1,234,568`.
///
/// `None` and non-finite values render as `N/A`. Halves round toward positive
/// infinity, and negative amounts keep the sign after the dollar sign
/// (`$-1,500`).
pub fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return MISSING_VALUE.to_string();
    };
    let rounded = (value + 0.5).floor();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("${sign}{}", group_thousands(rounded.abs() as u128))
}

/// Render an area rounded to whole square feet, e.g. `25,000 SF`.
///
/// `None` and non-finite values render as `N/A`.
pub fn format_square_feet(value: Option<f64>) -> String {
    match value.filter(|value| value.is_finite() && *value >= 0.0) {
        Some(value) => format!("{} SF", group_thousands((value + 0.5).floor() as u128)),
        None => MISSING_VALUE.to_string(),
    }
}

/// Render a byte count with 1024-based units, e.g. `1.5 KB`.
///
/// At most two decimals are kept and trailing zeros dropped. Sizes beyond
/// the largest unit stay in that unit.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", FILE_SIZE_UNITS[0]);
    }
    let mut scaled = bytes as f64;
    let mut unit = 0;
    while scaled >= FILE_SIZE_STEP && unit + 1 < FILE_SIZE_UNITS.len() {
        scaled /= FILE_SIZE_STEP;
        unit += 1;
    }
    format!("{} {}", trim_decimals(scaled), FILE_SIZE_UNITS[unit])
}

/// Lowercased extension after the last `.` of `filename`.
///
/// Empty when there is no dot, the dot is the first character, or nothing
/// follows it.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => filename[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

fn group_thousands(value: u128) -> String {
    let raw = value.to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    grouped_reversed.chars().rev().collect()
}

fn trim_decimals(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
