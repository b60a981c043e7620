/// Column names expected in the header row of a comps export.
///
/// Columns are addressed by exact header text; a renamed header silently
/// falls back to the field default.
pub mod headers {
    /// Street address column.
    pub const STREET_ADDRESS: &str = "Street Address";
    /// Market (submarket) column.
    pub const MARKET: &str = "Market";
    /// City column.
    pub const CITY: &str = "City";
    /// Space type column (Office, Retail, ...).
    pub const SPACE_TYPE: &str = "Space Type";
    /// Lease execution date column.
    pub const EXECUTION_DATE: &str = "Execution Date";
    /// Free-form comments column.
    pub const COMMENTS: &str = "Comments";
    /// Leased floor area column.
    pub const TRANSACTION_SQFT: &str = "Transaction SQFT";
    /// Tenant name column.
    pub const TENANT_NAME: &str = "Tenant Name";
    /// Transaction quarter column (for example `Q1 2024`).
    pub const TRANSACTION_QUARTER: &str = "Transaction Quarter";
    /// Tenant ownership column.
    pub const TENANT_OWNERSHIP: &str = "Tenant Ownership";
    /// Transaction type column.
    pub const TRANSACTION_TYPE: &str = "Transaction Type";
    /// Starting rent column (USD per square foot per year).
    pub const STARTING_RENT: &str = "Starting Rent (USD) (per year)";
    /// Rent schedule column.
    pub const RENT_SCHEDULE: &str = "Rent Schedule (USD)";
    /// Rent bump in dollars column.
    pub const RENT_BUMP_DOLLAR: &str = "Rent Bump Dollar (USD)";
    /// Rent bump percentage column.
    pub const RENT_BUMP_PERCENT: &str = "Rent Bump Percent";
    /// Free rent column.
    pub const FREE_RENT: &str = "Free Rent";
    /// Tenant improvement work value column.
    pub const WORK_VALUE: &str = "Work Value (USD)";
    /// Effective rent column.
    pub const EFFECTIVE_RENT: &str = "Effective Rent (USD) (per year)";
    /// Floors occupied column.
    pub const FLOORS_OCCUPIED: &str = "Floors Occupied";
    /// Lease term column.
    pub const LEASE_TERM: &str = "Lease Term";
    /// Lease expiration date column.
    pub const EXPIRATION_DATE: &str = "Expiration Date";
    /// Geo point column, formatted like `(40.7128, -74.0060)`.
    pub const GEO_POINT: &str = "Geo Point";
}

/// Field defaults applied during normalization.
pub mod defaults {
    /// Tenant name used when the source leaves it blank.
    pub const UNDISCLOSED_TENANT: &str = "Undisclosed";
    /// Default for numeric-looking string fields (work value, effective rent).
    pub const ZERO_TEXT: &str = "0";
}

/// Constants used by lease identity rendering.
pub mod identity {
    /// Delimiter used by legacy composite lease keys.
    pub const LEGACY_KEY_DELIMITER: char = '-';
}

/// Constants used by the tokenizer and field extractors.
pub mod patterns {
    /// One delimited field: a quoted span or a run of non-commas, plus an
    /// optional trailing comma.
    pub const FIELD_TOKEN: &str = r#"("([^"]*)"|[^,]*),?"#;
    /// Geo point text such as `(40.7128, -74.0060)`.
    pub const GEO_POINT: &str = r"\(([-\d.]+),\s*([-\d.]+)\)";
    /// Substring that marks a space type as retail for map breakdowns.
    pub const RETAIL_MARKER: &str = "retail";
}

/// Constants used by the persisted CRM store and its wire encoding.
pub mod store {
    /// Key holding the JSON list of starred lease identities.
    pub const STARRED_LEASES_KEY: &str = "starredLeases";
    /// Key holding the JSON list of deals.
    pub const DEALS_KEY: &str = "deals";

    /// Key used for store-level metadata in file backends.
    pub const META_KEY: &[u8] = b"__meta__";
    /// Key prefix for user values in file backends.
    pub const VALUE_PREFIX: &[u8] = b"kv:";
    /// Tombstone marker byte for removed values.
    pub const VALUE_TOMBSTONE: u8 = b'-';
    /// Version tag for persisted value records.
    pub const VALUE_RECORD_VERSION: u8 = 1;
    /// Prefix marker for bitcode-encoded payloads.
    pub const BITCODE_PREFIX: u8 = b'B';
    /// Version tag for store metadata compatibility checks.
    pub const STORE_VERSION: u8 = 1;

    /// Environment variable overriding the store directory.
    pub const STORE_DIR_ENV: &str = "LEASE_COMPS_STORE_DIR";
    /// Default directory for persisted store files.
    pub const DEFAULT_STORE_DIR: &str = ".lease_comps_store";
    /// Default filename for persisted store files.
    pub const DEFAULT_STORE_FILENAME: &str = "crm_store.bin";
}

/// Units used by display helpers.
pub mod format {
    /// Step between file-size units.
    pub const FILE_SIZE_STEP: f64 = 1024.0;
    /// File-size unit labels in ascending order.
    pub const FILE_SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    /// Placeholder for missing currency values.
    pub const MISSING_VALUE: &str = "N/A";
}
