/// Free-text street address of a leased property.
/// Example: `123 Main St`
pub type Address = String;
/// Tenant name as reported by the source, or `Undisclosed`.
/// Examples: `Acme Corp`, `Undisclosed`
pub type TenantName = String;
/// Execution date text exactly as it appeared in the source row.
/// Examples: `2024-01-15`, `01/15/2024`
pub type DateText = String;
/// Column name from the header row of a comps export.
/// Examples: `Street Address`, `Geo Point`
pub type HeaderName = String;
/// Raw field text produced by the line tokenizer.
/// Example: `$1,200/mo`
pub type RawField = String;
/// Key under which a value is persisted in a key/value backend.
/// Examples: `starredLeases`, `deals`
pub type StoreKey = String;
/// Identifier of a deal in the pipeline.
/// Examples: `1`, `1718900000000`
pub type DealId = String;
/// Legacy composite lease key joined with `-`.
/// Example: `123 Main St-Acme Corp-2024-01-15`
pub type LegacyLeaseKey = String;
/// Identifier handed out to store subscribers.
pub type SubscriptionId = u64;
