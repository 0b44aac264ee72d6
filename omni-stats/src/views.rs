//! View assembly: sorted projections of the derived rows.
//!
//! Every sort is a stable descending sort on a single numeric key, so rows
//! with equal keys keep their input order and the output is deterministic for
//! the same snapshot.

use std::cmp::Ordering;

use crate::metrics::DerivedRow;

/// How many rows each "Top" list carries.
const TOP_N: usize = 10;

/// The five named dashboard views. Each is an independent copy; assembling
/// views never mutates the source rows.
#[derive(Debug, Clone, Default)]
pub struct DashboardViews {
    /// Highest FDV / Volume 24h, traded rows only, first 10.
    pub top_fdv_volume: Vec<DerivedRow>,
    /// Highest FDV / Total OI, traded rows only, first 10.
    pub top_fdv_total_oi: Vec<DerivedRow>,
    /// Largest absolute hourly funding rate, traded rows only, first 10.
    pub top_funding: Vec<DerivedRow>,
    /// Every listing (zero-volume included), by volume descending.
    pub listings: Vec<DerivedRow>,
    /// Traded rows with all four ratio columns, by volume descending.
    pub analysis: Vec<DerivedRow>,
}

/// Stable descending sort on `key`; ties keep relative input order.
fn sort_desc_by_key(rows: &mut [DerivedRow], key: impl Fn(&DerivedRow) -> f64) {
    rows.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

fn traded(rows: &[DerivedRow]) -> Vec<DerivedRow> {
    rows.iter()
        .filter(|row| row.volume_24h > 0.0)
        .cloned()
        .collect()
}

fn top_n(rows: &[DerivedRow], key: impl Fn(&DerivedRow) -> f64) -> Vec<DerivedRow> {
    let mut sorted = traded(rows);
    sort_desc_by_key(&mut sorted, key);
    sorted.truncate(TOP_N);
    sorted
}

/// Build all five views from the derived-row collection.
pub fn assemble(rows: &[DerivedRow]) -> DashboardViews {
    let mut listings = rows.to_vec();
    sort_desc_by_key(&mut listings, |row| row.volume_24h);

    let mut analysis = traded(rows);
    sort_desc_by_key(&mut analysis, |row| row.volume_24h);

    DashboardViews {
        top_fdv_volume: top_n(rows, |row| row.fdv_over_volume),
        top_fdv_total_oi: top_n(rows, |row| row.fdv_over_total_oi),
        top_funding: top_n(rows, |row| row.hourly_funding_rate.abs()),
        listings,
        analysis,
    }
}
