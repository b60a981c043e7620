use regex::Regex;

use crate::constants::patterns::FIELD_TOKEN;
use crate::errors::CompsError;
use crate::types::{HeaderName, RawField};

/// Split raw text into trimmed, non-empty lines paired with 1-based line numbers.
pub fn non_empty_lines(raw: &str) -> Vec<(usize, &str)> {
    raw.split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}

/// Split a header line on commas, trimming each name.
pub fn split_header(line: &str) -> Vec<HeaderName> {
    line.split(',').map(|name| name.trim().to_string()).collect()
}

/// Line tokenizer for quoted-or-unquoted comma-separated fields.
///
/// A double-quoted span is a single field (commas inside are kept, quotes are
/// dropped). Anything else splits on commas. No escaping of quotes exists.
#[derive(Clone, Debug)]
pub struct LineTokenizer {
    field: Regex,
}

impl LineTokenizer {
    /// Compile the field pattern.
    pub fn new() -> Result<Self, CompsError> {
        let field = Regex::new(FIELD_TOKEN)
            .map_err(|err| CompsError::Parse(format!("invalid field pattern: {err}")))?;
        Ok(Self { field })
    }

    /// Tokenize one data line into trimmed fields.
    ///
    /// The number of returned fields may exceed the header width (a trailing
    /// empty match is possible); callers index by position and ignore extras.
    pub fn tokenize(&self, line: &str) -> Vec<RawField> {
        self.field
            .captures_iter(line)
            .map(|caps| {
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(1))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                value.trim().to_string()
            })
            .collect()
    }
}
