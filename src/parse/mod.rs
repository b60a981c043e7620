//! Comparable-lease ingestion.
//!
//! Two entry points share one tokenizer and one set of field normalizers:
//! - `parse_comparables` is lossy: rows without usable geography are dropped
//!   and any structural failure yields an empty vector.
//! - `parse_comparables_detailed` reports a per-row outcome so callers can tell
//!   an empty source from rejected rows.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::constants::defaults::UNDISCLOSED_TENANT;
use crate::constants::headers;
use crate::data::{Comparable, Coordinates};
use crate::errors::CompsError;
use crate::types::{HeaderName, RawField};

/// Field normalization helpers (money, sizes, geo points).
pub mod fields;
/// Line and header tokenization.
pub mod tokenizer;

use fields::{GeoPointExtractor, numeric_text, parse_money, parse_size, text_or};
use tokenizer::{LineTokenizer, non_empty_lines, split_header};

/// Why a data row produced no comparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowRejection {
    /// No `(lat, lng)` pair could be read for the row.
    MissingCoordinates,
    /// The row's geo point is exactly `(0, 0)`.
    OriginCoordinates,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingCoordinates => f.write_str("no readable geo point"),
            RowRejection::OriginCoordinates => f.write_str("geo point is (0, 0)"),
        }
    }
}

/// Outcome for one data line.
#[derive(Clone, Debug, PartialEq)]
pub enum RowOutcome {
    /// The line produced a comparable.
    Parsed {
        /// 1-based line number in the source text.
        line: usize,
        /// Record built from the line.
        comparable: Comparable,
    },
    /// The line was rejected.
    Rejected {
        /// 1-based line number in the source text.
        line: usize,
        /// Why the line was dropped.
        reason: RowRejection,
    },
}

impl RowOutcome {
    /// 1-based source line number.
    pub fn line(&self) -> usize {
        match self {
            RowOutcome::Parsed { line, .. } | RowOutcome::Rejected { line, .. } => *line,
        }
    }
}

/// Per-row result of a detailed parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseReport {
    /// Header names in positional order (empty when the input was empty).
    pub headers: Vec<HeaderName>,
    /// One outcome per non-empty data line, in input order.
    pub rows: Vec<RowOutcome>,
}

impl ParseReport {
    /// Accepted comparables, in input order.
    pub fn comparables(&self) -> Vec<Comparable> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                RowOutcome::Parsed { comparable, .. } => Some(comparable.clone()),
                RowOutcome::Rejected { .. } => None,
            })
            .collect()
    }

    /// Consume the report, keeping only accepted comparables.
    pub fn into_comparables(self) -> Vec<Comparable> {
        self.rows
            .into_iter()
            .filter_map(|row| match row {
                RowOutcome::Parsed { comparable, .. } => Some(comparable),
                RowOutcome::Rejected { .. } => None,
            })
            .collect()
    }

    /// Rejected rows as `(line, reason)` pairs.
    pub fn rejections(&self) -> Vec<(usize, RowRejection)> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                RowOutcome::Rejected { line, reason } => Some((*line, *reason)),
                RowOutcome::Parsed { .. } => None,
            })
            .collect()
    }

    /// Number of data lines seen.
    pub fn data_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Positional lookup from header name to column index.
///
/// Duplicate header names resolve to the last occurrence.
#[derive(Clone, Debug)]
struct HeaderIndex {
    positions: HashMap<HeaderName, usize>,
}

impl HeaderIndex {
    fn new(names: &[HeaderName]) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            positions.insert(name.clone(), idx);
        }
        Self { positions }
    }

    /// Column index for `name`, if present.
    fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Field for `name`, or `""` when the column or token is missing.
    fn field<'a>(&self, tokens: &'a [RawField], name: &str) -> &'a str {
        self.positions
            .get(name)
            .and_then(|idx| tokens.get(*idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Reusable comps parser holding compiled patterns.
#[derive(Clone, Debug)]
pub struct ComparableParser {
    tokenizer: LineTokenizer,
    geo: GeoPointExtractor,
}

impl ComparableParser {
    /// Compile the tokenizer and geo point patterns.
    pub fn new() -> Result<Self, CompsError> {
        Ok(Self {
            tokenizer: LineTokenizer::new()?,
            geo: GeoPointExtractor::new()?,
        })
    }

    /// Parse `raw` into a per-row report.
    pub fn parse_detailed(&self, raw: &str) -> ParseReport {
        let lines = non_empty_lines(raw);
        let Some(((_, header_line), data_lines)) = lines.split_first() else {
            return ParseReport::default();
        };
        let headers = split_header(header_line);
        let index = HeaderIndex::new(&headers);

        let rows: Vec<RowOutcome> = data_lines
            .iter()
            .map(|(line_no, line)| self.parse_row(&index, *line_no, line))
            .collect();

        let rejected = rows
            .iter()
            .filter(|row| matches!(row, RowOutcome::Rejected { .. }))
            .count();
        debug!(data_rows = rows.len(), rejected, "parsed comparable rows");
        if rejected > 0 {
            warn!(
                rejected,
                total = rows.len(),
                "dropped comparable rows without usable coordinates"
            );
        }

        ParseReport { headers, rows }
    }

    /// Parse `raw`, keeping only comparables with usable coordinates.
    pub fn parse(&self, raw: &str) -> Vec<Comparable> {
        self.parse_detailed(raw).into_comparables()
    }

    fn parse_row(&self, index: &HeaderIndex, line_no: usize, line: &str) -> RowOutcome {
        let mut tokens = self.tokenizer.tokenize(line);
        let coordinates = self.coordinates_for(index, &mut tokens, line_no);
        let coordinates = match coordinates {
            Some(coords) if coords.is_origin() => {
                return RowOutcome::Rejected {
                    line: line_no,
                    reason: RowRejection::OriginCoordinates,
                };
            }
            Some(coords) => coords,
            None => {
                return RowOutcome::Rejected {
                    line: line_no,
                    reason: RowRejection::MissingCoordinates,
                };
            }
        };
        RowOutcome::Parsed {
            line: line_no,
            comparable: build_comparable(index, &tokens, coordinates),
        }
    }

    /// Coordinates from the geo point column.
    ///
    /// An unquoted pair split by the tokenizer is rejoined from the geo token
    /// and the token before it; that preceding fragment is then cleared.
    fn coordinates_for(
        &self,
        index: &HeaderIndex,
        tokens: &mut [RawField],
        line_no: usize,
    ) -> Option<Coordinates> {
        let geo_idx = index.position(headers::GEO_POINT)?;
        let geo_token = tokens.get(geo_idx).map(String::as_str).unwrap_or("");
        if let Some(coords) = self.geo.extract(geo_token) {
            return Some(coords);
        }
        let head_idx = geo_idx.checked_sub(1)?;
        let head = tokens.get(head_idx)?;
        let recovered = self.geo.extract_split(head, geo_token)?;
        debug!(line = line_no, "rejoined geo point split across columns");
        tokens[head_idx].clear();
        Some(recovered)
    }
}

fn build_comparable(
    index: &HeaderIndex,
    tokens: &[RawField],
    coordinates: Coordinates,
) -> Comparable {
    let field = |name: &str| index.field(tokens, name);
    Comparable {
        address: field(headers::STREET_ADDRESS).to_string(),
        market: field(headers::MARKET).to_string(),
        city: field(headers::CITY).to_string(),
        space_type: field(headers::SPACE_TYPE).to_string(),
        execution_date: field(headers::EXECUTION_DATE).to_string(),
        comments: field(headers::COMMENTS).to_string(),
        transaction_sqft: parse_size(field(headers::TRANSACTION_SQFT)),
        tenant_name: text_or(field(headers::TENANT_NAME), UNDISCLOSED_TENANT),
        transaction_quarter: field(headers::TRANSACTION_QUARTER).to_string(),
        tenant_ownership: field(headers::TENANT_OWNERSHIP).to_string(),
        transaction_type: field(headers::TRANSACTION_TYPE).to_string(),
        starting_rent: parse_money(field(headers::STARTING_RENT)),
        rent_schedule: field(headers::RENT_SCHEDULE).to_string(),
        rent_bump_dollar: field(headers::RENT_BUMP_DOLLAR).to_string(),
        rent_bump_percent: field(headers::RENT_BUMP_PERCENT).to_string(),
        free_rent: field(headers::FREE_RENT).to_string(),
        work_value: numeric_text(field(headers::WORK_VALUE)),
        effective_rent: numeric_text(field(headers::EFFECTIVE_RENT)),
        floors_occupied: field(headers::FLOORS_OCCUPIED).to_string(),
        lease_term: field(headers::LEASE_TERM).to_string(),
        expiration_date: field(headers::EXPIRATION_DATE).to_string(),
        coordinates,
    }
}

/// Parse comps text, dropping rows without usable coordinates.
///
/// Never fails: if the parser cannot be constructed the error is logged and an
/// empty vector is returned. Use `parse_comparables_detailed` to observe
/// failures and rejected rows.
pub fn parse_comparables(raw: &str) -> Vec<Comparable> {
    match ComparableParser::new() {
        Ok(parser) => parser.parse(raw),
        Err(err) => {
            warn!(error = %err, "comparable parser unavailable; returning no rows");
            Vec::new()
        }
    }
}

/// Parse comps text into a per-row report.
pub fn parse_comparables_detailed(raw: &str) -> Result<ParseReport, CompsError> {
    Ok(ComparableParser::new()?.parse_detailed(raw))
}

/// Read and parse a comps export from disk.
pub fn parse_comparables_file(path: impl AsRef<Path>) -> Result<ParseReport, CompsError> {
    let raw = fs::read_to_string(path.as_ref())?;
    parse_comparables_detailed(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Street Address,Market,City,Space Type,Execution Date,Comments,Transaction SQFT,Tenant Name,Transaction Quarter,Tenant Ownership,Transaction Type,Starting Rent (USD) (per year),Rent Schedule (USD),Rent Bump Dollar (USD),Rent Bump Percent,Free Rent,Work Value (USD),Effective Rent (USD) (per year),Floors Occupied,Lease Term,Expiration Date,Geo Point";

    #[test]
    fn parses_reference_row() {
        let raw = format!(
            "{HEADER}\n123 Main St,Manhattan,New York,Office,2024-01-15,,25000,Acme Corp,Q1 2024,Private,New Lease,85,,,,,,,,,(40.7128, -74.0060)"
        );
        let comps = parse_comparables(&raw);
        assert_eq!(comps.len(), 1);
        let comp = &comps[0];
        assert_eq!(comp.address, "123 Main St");
        assert_eq!(comp.market, "Manhattan");
        assert_eq!(comp.city, "New York");
        assert_eq!(comp.space_type, "Office");
        assert_eq!(comp.execution_date, "2024-01-15");
        assert_eq!(comp.transaction_sqft, 25000);
        assert_eq!(comp.starting_rent, 85.0);
        assert_eq!(comp.tenant_name, "Acme Corp");
        assert_eq!(comp.transaction_quarter, "Q1 2024");
        assert_eq!(comp.work_value, "0");
        assert_eq!(comp.effective_rent, "0");
        assert_eq!(comp.expiration_date, "");
        assert_eq!(comp.coordinates, Coordinates::new(40.7128, -74.006));
    }

    #[test]
    fn pair_outside_geo_column_never_supplies_coordinates() {
        let raw = "Street Address,Comments,Tenant Name,Transaction SQFT,Geo Point\n\
                   9 Elm St,\"Suite (1, 2) near park\",Acme,100,\n\
                   7 Oak St,Acme,100,\"Suite (3, 4)\",\n\
                   5 Ash St,\"(5, 6)\",Acme,100,\"(40.5, -73.5)\"";
        let report = parse_comparables_detailed(raw).unwrap();
        assert_eq!(
            report.rejections(),
            vec![
                (2, RowRejection::MissingCoordinates),
                (3, RowRejection::MissingCoordinates)
            ]
        );
        let comps = report.comparables();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].address, "5 Ash St");
        assert_eq!(comps[0].comments, "(5, 6)");
        assert_eq!(comps[0].coordinates, Coordinates::new(40.5, -73.5));
    }

    #[test]
    fn quoted_geo_point_lands_in_its_column() {
        let raw = format!(
            "{HEADER}\n1 Pine St,FiDi,New York,Retail,2023-05-01,\"Corner, ground floor\",1800,,Q2 2023,,Renewal,\"$1,200/mo\",,,,,\"$150,000\",\"$95.50\",1,5 years,2028-05-01,\"(40.7069, -74.0113)\""
        );
        let comps = parse_comparables(&raw);
        assert_eq!(comps.len(), 1);
        let comp = &comps[0];
        assert_eq!(comp.comments, "Corner, ground floor");
        assert_eq!(comp.tenant_name, "Undisclosed");
        assert_eq!(comp.starting_rent, 1200.0);
        assert_eq!(comp.work_value, "150000");
        assert_eq!(comp.effective_rent, "95.50");
        assert_eq!(comp.lease_term, "5 years");
        assert_eq!(comp.expiration_date, "2028-05-01");
        assert_eq!(comp.coordinates, Coordinates::new(40.7069, -74.0113));
    }

    #[test]
    fn empty_and_header_only_inputs_yield_nothing() {
        assert!(parse_comparables("").is_empty());
        assert!(parse_comparables("\n \n").is_empty());
        assert!(parse_comparables(HEADER).is_empty());
        let report = parse_comparables_detailed(HEADER).unwrap();
        assert_eq!(report.headers.len(), 22);
        assert!(report.rows.is_empty());
    }

    #[test]
    fn origin_and_missing_geography_are_reported_per_row() {
        let raw = format!(
            "{HEADER}\nA St,M,C,Office,2024-01-01,,10,T,,,,1,,,,,,,,,,\"(0, 0)\"\n\nB St,M,C,Office,2024-01-01,,10,T,,,,1,,,,,,,,,,\nC St,M,C,Office,2024-01-01,,10,T,,,,1,,,,,,,,,,\"(1.5, 2.5)\""
        );
        let report = parse_comparables_detailed(&raw).unwrap();
        assert_eq!(report.data_rows(), 3);
        assert_eq!(
            report.rejections(),
            vec![
                (2, RowRejection::OriginCoordinates),
                (4, RowRejection::MissingCoordinates)
            ]
        );
        let comps = report.comparables();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].address, "C St");
        assert_eq!(report.rows[2].line(), 5);
        assert_eq!(parse_comparables(&raw), comps);
    }

    #[test]
    fn short_rows_pad_missing_fields_with_defaults() {
        let raw = "Geo Point,Street Address,Tenant Name,Transaction SQFT\n\"(10, 20)\",9 Elm St";
        let comps = parse_comparables(raw);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].address, "9 Elm St");
        assert_eq!(comps[0].tenant_name, "Undisclosed");
        assert_eq!(comps[0].transaction_sqft, 0);
        assert_eq!(comps[0].market, "");
    }

    #[test]
    fn renamed_header_falls_back_to_default() {
        let raw = "Address,Geo Point\n9 Elm St,\"(10, 20)\"";
        let comps = parse_comparables(raw);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].address, "");
    }
}
