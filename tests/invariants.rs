use std::collections::HashSet;

use lease_comps::data::LeaseId;
use lease_comps::{
    FilterCriteria, RowOutcome, filter_comparables, group_by_address, parse_comparables,
    parse_comparables_detailed, summarize,
};

const HEADER: &str = "Street Address,Market,City,Space Type,Execution Date,Comments,Transaction SQFT,Tenant Name,Transaction Quarter,Tenant Ownership,Transaction Type,Starting Rent (USD) (per year),Rent Schedule (USD),Rent Bump Dollar (USD),Rent Bump Percent,Free Rent,Work Value (USD),Effective Rent (USD) (per year),Floors Occupied,Lease Term,Expiration Date,Geo Point";

const ROWS: [(&str, &str, &str, &str, &str, &str, &str); 6] = [
    ("1 A St", "Office", "2024-01-15", "25000", "Acme", "$85.00", "(40.71, -74.00)"),
    ("2 B St", "Retail", "2023-06-01", "1,800", "Beta", "$1,200/mo", "(40.72, -74.01)"),
    ("3 C St", "Office", "2022-11-30", "9000", "", "62.5", "(0, 0)"),
    ("1 A St", "Office", "2021-04-02", "25000", "Delta", "70", "(40.71, -74.00)"),
    ("4 D St", "Office", "03/15/2024", "4000", "Echo", "n/a", "(40.75, -73.99)"),
    ("5 E St", "Office", "2024-02-01", "12000", "Foxtrot", "55", "unknown"),
];

fn sample_text() -> String {
    let mut lines = vec![HEADER.to_string()];
    for (address, space_type, date, sqft, tenant, rent, geo) in ROWS {
        lines.push(format!(
            "{address},Manhattan,New York,{space_type},{date},,\"{sqft}\",{tenant},,,,\"{rent}\",,,,,,,,,,\"{geo}\""
        ));
    }
    lines.join("\n")
}

#[test]
fn parse_never_returns_more_records_than_data_rows() {
    let raw = sample_text();
    let data_rows = raw.lines().count() - 1;
    let comps = parse_comparables(&raw);
    assert!(comps.len() <= data_rows);
    assert_eq!(comps.len(), 4);
}

#[test]
fn identity_fields_reconstruct_from_input_rows() {
    let raw = sample_text();
    let report = parse_comparables_detailed(&raw).unwrap();
    let lines: Vec<&str> = raw.split('\n').collect();
    for outcome in &report.rows {
        let RowOutcome::Parsed { line, comparable } = outcome else {
            continue;
        };
        let source = lines[line - 1];
        assert!(source.starts_with(&format!("{},", comparable.address)));
        assert!(source.contains(&format!(",{},", comparable.execution_date)));
        assert!(source.contains(&format!(",{},", comparable.tenant_name)));
    }
    let ids: HashSet<LeaseId> = report
        .comparables()
        .iter()
        .map(|comp| comp.lease_id())
        .collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn origin_rows_are_excluded_and_rent_text_is_normalized() {
    let comps = parse_comparables(&sample_text());
    assert!(comps.iter().all(|comp| !comp.coordinates.is_origin()));
    assert!(comps.iter().all(|comp| comp.address != "3 C St"));

    let beta = comps.iter().find(|comp| comp.tenant_name == "Beta").unwrap();
    assert_eq!(beta.starting_rent, 1200.0);
    assert_eq!(beta.transaction_sqft, 1800);

    let echo = comps.iter().find(|comp| comp.tenant_name == "Echo").unwrap();
    assert_eq!(echo.starting_rent, 0.0);
}

#[test]
fn empty_criteria_is_identity_and_equal_sqft_bounds_are_exact() {
    let comps = parse_comparables(&sample_text());
    assert_eq!(filter_comparables(&comps, &FilterCriteria::new()), comps);

    let exact = filter_comparables(
        &comps,
        &FilterCriteria::new().with_min_sqft(25000).with_max_sqft(25000),
    );
    assert_eq!(exact.len(), 2);
    assert!(exact.iter().all(|comp| comp.transaction_sqft == 25000));
}

#[test]
fn aggregates_follow_filtered_records() {
    let comps = parse_comparables(&sample_text());
    let office = filter_comparables(&comps, &FilterCriteria::new().with_space_type("Office"));
    let summary = summarize(&office);
    assert_eq!(summary.count, 3);
    assert!((summary.mean_starting_rent - (85.0 + 70.0 + 0.0) / 3.0).abs() < 1e-9);
    assert_eq!(summary.total_transaction_sqft, 54000);

    let groups = group_by_address(&office);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["1 A St"].len(), 2);
    assert_eq!(groups["1 A St"][0].tenant_name, "Acme");

    assert!(summarize(&[]).mean_starting_rent.is_nan());
}
