use chrono::NaiveDate;

use crate::data::Comparable;
use crate::dates::parse_execution_date;

/// Optional predicates narrowing a set of comparables.
///
/// Every present criterion must hold (logical AND); absent criteria impose no
/// constraint. All ranges are inclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    /// Exact, case-sensitive space type.
    pub space_type: Option<String>,
    /// Earliest execution date kept.
    pub date_start: Option<NaiveDate>,
    /// Latest execution date kept.
    pub date_end: Option<NaiveDate>,
    /// Smallest transaction area kept.
    pub min_sqft: Option<u64>,
    /// Largest transaction area kept.
    pub max_sqft: Option<u64>,
    /// Lowest starting rent kept.
    pub min_rent: Option<f64>,
    /// Highest starting rent kept.
    pub max_rent: Option<f64>,
}

impl FilterCriteria {
    /// Criteria that keep everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact space type.
    pub fn with_space_type(mut self, space_type: impl Into<String>) -> Self {
        self.space_type = Some(space_type.into());
        self
    }

    /// Keep leases executed on or after `start`, and on or before `end`.
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_start = Some(start);
        self.date_end = Some(end);
        self
    }

    /// Keep leases executed on or after `start`.
    pub fn with_date_start(mut self, start: NaiveDate) -> Self {
        self.date_start = Some(start);
        self
    }

    /// Keep leases executed on or before `end`.
    pub fn with_date_end(mut self, end: NaiveDate) -> Self {
        self.date_end = Some(end);
        self
    }

    /// Keep leases of at least `min` square feet.
    pub fn with_min_sqft(mut self, min: u64) -> Self {
        self.min_sqft = Some(min);
        self
    }

    /// Keep leases of at most `max` square feet.
    pub fn with_max_sqft(mut self, max: u64) -> Self {
        self.max_sqft = Some(max);
        self
    }

    /// Keep leases with starting rent of at least `min`.
    pub fn with_min_rent(mut self, min: f64) -> Self {
        self.min_rent = Some(min);
        self
    }

    /// Keep leases with starting rent of at most `max`.
    pub fn with_max_rent(mut self, max: f64) -> Self {
        self.max_rent = Some(max);
        self
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// True when `comp` satisfies every present criterion.
    pub fn matches(&self, comp: &Comparable) -> bool {
        if let Some(space_type) = &self.space_type
            && comp.space_type != *space_type
        {
            return false;
        }
        if !self.matches_dates(comp) {
            return false;
        }
        if let Some(min) = self.min_sqft
            && comp.transaction_sqft < min
        {
            return false;
        }
        if let Some(max) = self.max_sqft
            && comp.transaction_sqft > max
        {
            return false;
        }
        if let Some(min) = self.min_rent
            && comp.starting_rent < min
        {
            return false;
        }
        if let Some(max) = self.max_rent
            && comp.starting_rent > max
        {
            return false;
        }
        true
    }

    /// Unparsable execution dates are never excluded by date bounds.
    fn matches_dates(&self, comp: &Comparable) -> bool {
        if self.date_start.is_none() && self.date_end.is_none() {
            return true;
        }
        let Some(executed) = parse_execution_date(&comp.execution_date) else {
            return true;
        };
        if let Some(start) = self.date_start
            && executed < start
        {
            return false;
        }
        if let Some(end) = self.date_end
            && executed > end
        {
            return false;
        }
        true
    }
}

/// Stable filter: keeps matching comparables in their input order.
pub fn filter_comparables(comps: &[Comparable], criteria: &FilterCriteria) -> Vec<Comparable> {
    comps
        .iter()
        .filter(|comp| criteria.matches(comp))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Coordinates;

    fn comp(address: &str, space_type: &str, date: &str, sqft: u64, rent: f64) -> Comparable {
        Comparable {
            address: address.to_string(),
            market: "Manhattan".to_string(),
            city: "New York".to_string(),
            space_type: space_type.to_string(),
            execution_date: date.to_string(),
            comments: String::new(),
            transaction_sqft: sqft,
            tenant_name: "Undisclosed".to_string(),
            transaction_quarter: String::new(),
            tenant_ownership: String::new(),
            transaction_type: String::new(),
            starting_rent: rent,
            rent_schedule: String::new(),
            rent_bump_dollar: String::new(),
            rent_bump_percent: String::new(),
            free_rent: String::new(),
            work_value: "0".to_string(),
            effective_rent: "0".to_string(),
            floors_occupied: String::new(),
            lease_term: String::new(),
            expiration_date: String::new(),
            coordinates: Coordinates::new(40.0, -74.0),
        }
    }

    fn sample() -> Vec<Comparable> {
        vec![
            comp("1 A St", "Office", "2024-01-15", 25000, 85.0),
            comp("2 B St", "Retail", "2023-06-01", 1800, 120.0),
            comp("3 C St", "Office", "2022-11-30", 9000, 62.5),
            comp("4 D St", "office", "2024-03-01", 25000, 70.0),
            comp("5 E St", "Office", "not a date", 4000, 55.0),
        ]
    }

    fn addresses(comps: &[Comparable]) -> Vec<&str> {
        comps.iter().map(|comp| comp.address.as_str()).collect()
    }

    #[test]
    fn empty_criteria_returns_input_unchanged() {
        let comps = sample();
        let criteria = FilterCriteria::new();
        assert!(criteria.is_empty());
        assert_eq!(filter_comparables(&comps, &criteria), comps);
    }

    #[test]
    fn space_type_is_exact_and_case_sensitive() {
        let criteria = FilterCriteria::new().with_space_type("Office");
        assert!(!criteria.is_empty());
        let out = filter_comparables(&sample(), &criteria);
        assert_eq!(addresses(&out), vec!["1 A St", "3 C St", "5 E St"]);
        let partial = FilterCriteria::new().with_space_type("Off");
        assert!(filter_comparables(&sample(), &partial).is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive_and_skip_unparsable_dates() {
        let criteria = FilterCriteria::new().with_date_range(
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        );
        let out = filter_comparables(&sample(), &criteria);
        assert_eq!(addresses(&out), vec!["1 A St", "2 B St", "5 E St"]);
    }

    #[test]
    fn open_ended_date_bounds() {
        let after =
            FilterCriteria::new().with_date_start(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(
            addresses(&filter_comparables(&sample(), &after)),
            vec!["1 A St", "4 D St", "5 E St"]
        );
        let before =
            FilterCriteria::new().with_date_end(NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(
            addresses(&filter_comparables(&sample(), &before)),
            vec!["3 C St", "5 E St"]
        );
    }

    #[test]
    fn equal_sqft_bounds_keep_exact_matches_only() {
        let criteria = FilterCriteria::new().with_min_sqft(25000).with_max_sqft(25000);
        let out = filter_comparables(&sample(), &criteria);
        assert_eq!(addresses(&out), vec!["1 A St", "4 D St"]);
        assert!(out.iter().all(|comp| comp.transaction_sqft == 25000));
    }

    #[test]
    fn rent_and_type_criteria_combine_with_and() {
        let criteria = FilterCriteria::new()
            .with_space_type("Office")
            .with_min_rent(60.0)
            .with_max_rent(85.0);
        let out = filter_comparables(&sample(), &criteria);
        assert_eq!(addresses(&out), vec!["1 A St", "3 C St"]);
    }

    #[test]
    fn zero_max_sqft_is_a_real_bound() {
        let criteria = FilterCriteria::new().with_max_sqft(0);
        assert!(filter_comparables(&sample(), &criteria).is_empty());
    }
}
