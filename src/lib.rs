#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Summaries, grouping, and display ordering over comparables.
pub mod aggregate;
/// Command-line runner used by the `lease_comps` binary.
pub mod cli;
/// Store location configuration.
pub mod config;
/// Centralized constants: column headers, patterns, store keys.
pub mod constants;
/// Comparable lease records and their identity.
pub mod data;
/// Execution-date parsing.
pub mod dates;
/// Deal pipeline records and operations.
pub mod deals;
/// Predicate filtering of comparables.
pub mod filter;
/// Display helpers for currency, areas, and file sizes.
pub mod format;
/// Comps text parsing.
pub mod parse;
/// Persisted CRM state over pluggable key/value backends.
pub mod store;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregate::{
    ComparableSummary, SpaceTypeBreakdown, group_by_address, map_center,
    sorted_by_execution_date_desc, space_type_breakdown, summarize,
};
pub use config::StoreConfig;
pub use data::{Comparable, Coordinates, LeaseId};
pub use dates::parse_execution_date;
pub use deals::{Deal, DealDetails, DealDocument, DealDraft, DealStage, Priority, seed_deals};
pub use errors::CompsError;
pub use filter::{FilterCriteria, filter_comparables};
pub use parse::{
    ComparableParser, ParseReport, RowOutcome, RowRejection, parse_comparables,
    parse_comparables_detailed, parse_comparables_file,
};
pub use store::{CrmStore, FileBackend, KvBackend, MemoryBackend, StoreEvent};
pub use types::{Address, DealId, LegacyLeaseKey, StoreKey, SubscriptionId, TenantName};
