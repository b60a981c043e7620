use serde::{Deserialize, Serialize};

use crate::constants::identity::LEGACY_KEY_DELIMITER;

pub use crate::types::{Address, DateText, LegacyLeaseKey, TenantName};

/// Latitude/longitude pair extracted from a geo point column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are exactly zero.
    ///
    /// The origin doubles as the "no geography" marker, so rows resolving to it
    /// are dropped by the parser.
    pub fn is_origin(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// One historical lease transaction used for market benchmarking.
///
/// Produced fresh by every parse call and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparable {
    /// Street address as written in the export.
    pub address: Address,
    /// Submarket name.
    pub market: String,
    /// City name.
    pub city: String,
    /// Categorical use such as `Office` or `Retail`; compared case-sensitively.
    pub space_type: String,
    /// Kept as source text; parsed only when compared.
    pub execution_date: DateText,
    /// Free-text broker notes.
    pub comments: String,
    /// Leased floor area, zero when the source value is unparsable.
    pub transaction_sqft: u64,
    /// Defaults to `Undisclosed` when the source leaves it blank.
    pub tenant_name: TenantName,
    /// Quarter label such as `Q1 2024`.
    pub transaction_quarter: String,
    /// Ownership type such as `Private` or `Public`.
    pub tenant_ownership: String,
    /// Deal type such as `New Lease` or `Renewal`.
    pub transaction_type: String,
    /// Currency units per square foot per year, zero when unparsable.
    pub starting_rent: f64,
    /// Escalation schedule text.
    pub rent_schedule: String,
    /// Fixed escalation amount text.
    pub rent_bump_dollar: String,
    /// Percentage escalation text.
    pub rent_bump_percent: String,
    /// Free rent concession text.
    pub free_rent: String,
    /// Digits and periods only; `"0"` when absent.
    pub work_value: String,
    /// Digits and periods only; `"0"` when absent.
    pub effective_rent: String,
    /// Floor numbers or ranges, e.g. `15-17`.
    pub floors_occupied: String,
    /// Term text such as `10 years`.
    pub lease_term: String,
    /// Kept as source text.
    pub expiration_date: DateText,
    /// Never exactly `(0, 0)` for parsed records.
    pub coordinates: Coordinates,
}

impl Comparable {
    /// Structured identity of this lease.
    pub fn lease_id(&self) -> LeaseId {
        LeaseId::new(
            self.address.clone(),
            self.tenant_name.clone(),
            self.execution_date.clone(),
        )
    }

    /// Legacy `address-tenant-date` key for this lease.
    pub fn legacy_key(&self) -> LegacyLeaseKey {
        render_legacy_key(&self.address, &self.tenant_name, &self.execution_date)
    }

    /// True when the lower-cased space type mentions retail.
    pub fn is_retail(&self) -> bool {
        self.space_type
            .to_lowercase()
            .contains(crate::constants::patterns::RETAIL_MARKER)
    }
}

/// Identity of a lease: address, tenant, and execution date.
///
/// Comparables carry no identifier of their own. This triple is what starred
/// sets and deals refer to. It is persisted structurally, so field contents
/// (including `-`) never make two identities collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseId {
    /// `Comparable::address`.
    pub address: Address,
    /// `Comparable::tenant_name` after defaulting.
    pub tenant_name: TenantName,
    /// `Comparable::execution_date` as source text.
    pub execution_date: DateText,
}

impl LeaseId {
    /// Build an identity from its three parts.
    pub fn new(
        address: impl Into<Address>,
        tenant_name: impl Into<TenantName>,
        execution_date: impl Into<DateText>,
    ) -> Self {
        Self {
            address: address.into(),
            tenant_name: tenant_name.into(),
            execution_date: execution_date.into(),
        }
    }

    /// Render the legacy composite key (`address-tenant-date`).
    ///
    /// Not injective: `("A-B", "C", d)` and `("A", "B-C", d)` render the same key.
    pub fn legacy_key(&self) -> LegacyLeaseKey {
        render_legacy_key(&self.address, &self.tenant_name, &self.execution_date)
    }

    /// True when `comp` has exactly this identity.
    pub fn matches(&self, comp: &Comparable) -> bool {
        self.address == comp.address
            && self.tenant_name == comp.tenant_name
            && self.execution_date == comp.execution_date
    }
}

fn render_legacy_key(address: &str, tenant_name: &str, execution_date: &str) -> LegacyLeaseKey {
    format!(
        "{address}{LEGACY_KEY_DELIMITER}{tenant_name}{LEGACY_KEY_DELIMITER}{execution_date}"
    )
}
