/// Omni Stats - Core Library
///
/// Polls the Variational Omni stats endpoint, joins listings with a locally
/// supplied token-supply table, and derives the valuation metrics the
/// dashboard renders:
/// - Serde schema for the stats payload, lenient at the field level
/// - Supply table CSV loader with a process-wide TTL cache
/// - Metric engine (FDV, hourly funding normalization, OI ratios)
/// - Display formatters (magnitude suffixes, per-view precisions)
/// - View assembly (Top-10 lists, full listings, volume-filtered analysis)
pub mod client;
pub mod error;
pub mod format;
pub mod metrics;
pub mod snapshot;
pub mod supply;
pub mod views;

// Re-export the types a presenter needs for convenience
pub use client::{DEFAULT_HTTP_TIMEOUT, StatsClient, StatsUpdate};
pub use error::StatsError;
pub use metrics::{DerivedRow, derive_row, derive_rows};
pub use snapshot::{Listing, MarketSnapshot, OpenInterestSides};
pub use supply::{DEFAULT_SUPPLY_TTL, SupplyCache, load_supply_table, normalize_ticker};
pub use views::{DashboardViews, assemble};
