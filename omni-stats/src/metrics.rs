//! Metric engine: joins snapshot listings with the supply table and derives
//! per-row valuation metrics.

use std::collections::HashMap;

use crate::snapshot::{Listing, MarketSnapshot};
use crate::supply::normalize_ticker;

/// Hours in the funding de-annualization window (flat linear division, no
/// compounding correction).
const HOURS_PER_YEAR: f64 = 365.0 * 24.0;

/// One derived row, recomputed on every fetch and discarded after render.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub volume_24h: f64,
    /// True fractional hourly rate (0.0001 meaning 0.01%).
    pub hourly_funding_rate: f64,
    pub base_spread_bps: f64,
    pub long_oi: f64,
    pub short_oi: f64,
    pub total_oi: f64,
    /// `None` means FDV is unknown (no positive supply on record), which is
    /// distinct from a genuinely zero valuation. Ratio fields treat unknown
    /// as 0, pushing such rows to the bottom of descending rankings.
    pub fdv: Option<f64>,
    pub fdv_over_volume: f64,
    pub fdv_over_total_oi: f64,
    pub fdv_over_long_oi: f64,
    pub fdv_over_short_oi: f64,
}

/// numerator / denominator when the denominator is positive, else 0.
fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Derive one row from a listing and the supply lookup.
///
/// Pure: same inputs always produce the same row. Per-field defaults were
/// already absorbed at the serde boundary, so nothing here can fail.
pub fn derive_row(listing: &Listing, supply_map: &HashMap<String, f64>) -> DerivedRow {
    let ticker = normalize_ticker(&listing.ticker);

    let fdv = match supply_map.get(&ticker) {
        Some(&supply) if supply > 0.0 => Some(listing.mark_price * supply),
        _ => None,
    };
    let fdv_raw = fdv.unwrap_or(0.0);

    let long_oi = listing.open_interest.long_open_interest;
    let short_oi = listing.open_interest.short_open_interest;
    let total_oi = long_oi + short_oi;

    DerivedRow {
        ticker,
        name: listing.name.clone(),
        price: listing.mark_price,
        volume_24h: listing.volume_24h,
        hourly_funding_rate: listing.funding_rate / HOURS_PER_YEAR,
        base_spread_bps: listing.base_spread_bps,
        long_oi,
        short_oi,
        total_oi,
        fdv,
        fdv_over_volume: safe_div(fdv_raw, listing.volume_24h),
        fdv_over_total_oi: safe_div(fdv_raw, total_oi),
        fdv_over_long_oi: safe_div(fdv_raw, long_oi),
        fdv_over_short_oi: safe_div(fdv_raw, short_oi),
    }
}

/// Derive rows for every listing in a snapshot, preserving input order.
pub fn derive_rows(snapshot: &MarketSnapshot, supply_map: &HashMap<String, f64>) -> Vec<DerivedRow> {
    snapshot
        .listings
        .iter()
        .map(|listing| derive_row(listing, supply_map))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::OpenInterestSides;

    fn listing(ticker: &str, price: f64, volume: f64) -> Listing {
        Listing {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            mark_price: price,
            volume_24h: volume,
            ..Listing::default()
        }
    }

    #[test]
    fn test_scenario_abc() {
        let input = Listing {
            ticker: "ABC".to_string(),
            name: "Abc Coin".to_string(),
            mark_price: 10.0,
            volume_24h: 1000.0,
            funding_rate: 0.365,
            base_spread_bps: 1.0,
            open_interest: OpenInterestSides {
                long_open_interest: 100.0,
                short_open_interest: 50.0,
            },
        };
        let supply_map = HashMap::from([("ABC".to_string(), 1_000_000.0)]);

        let row = derive_row(&input, &supply_map);
        assert_eq!(row.fdv, Some(10_000_000.0));
        assert_eq!(row.fdv_over_volume, 10_000.0);
        assert_eq!(row.total_oi, 150.0);
        assert!((row.fdv_over_total_oi - 66_666.666_666).abs() < 0.001);
        assert!((row.hourly_funding_rate - 0.365 / 365.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_fdv_unknown_without_positive_supply() {
        let supply_map = HashMap::from([("ZERO".to_string(), 0.0)]);

        let absent = derive_row(&listing("MISSING", 5.0, 10.0), &supply_map);
        assert_eq!(absent.fdv, None);
        assert_eq!(absent.fdv_over_volume, 0.0);

        let zero_supply = derive_row(&listing("ZERO", 5.0, 10.0), &supply_map);
        assert_eq!(zero_supply.fdv, None);
    }

    #[test]
    fn test_join_key_is_normalized() {
        let supply_map = HashMap::from([("DOGE".to_string(), 1000.0)]);
        let row = derive_row(&listing("  doge ", 2.0, 1.0), &supply_map);
        assert_eq!(row.ticker, "DOGE");
        assert_eq!(row.fdv, Some(2000.0));
    }

    #[test]
    fn test_safe_division_zero_denominators() {
        let supply_map = HashMap::from([("ABC".to_string(), 100.0)]);
        let row = derive_row(&listing("ABC", 1.0, 0.0), &supply_map);
        assert_eq!(row.fdv, Some(100.0));
        assert_eq!(row.fdv_over_volume, 0.0);
        assert_eq!(row.fdv_over_total_oi, 0.0);
        assert_eq!(row.fdv_over_long_oi, 0.0);
        assert_eq!(row.fdv_over_short_oi, 0.0);
    }

    #[test]
    fn test_hourly_funding_from_annualized() {
        let mut input = listing("ABC", 1.0, 1.0);
        input.funding_rate = 0.0876;
        let row = derive_row(&input, &HashMap::new());
        assert!((row.hourly_funding_rate - 0.000_010).abs() < 1e-7);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let snapshot = MarketSnapshot {
            listings: vec![
                listing("A", 1.0, 10.0),
                listing("B", 2.0, 20.0),
                listing("C", 3.0, 0.0),
            ],
            ..MarketSnapshot::default()
        };
        let supply_map = HashMap::from([
            ("A".to_string(), 100.0),
            ("B".to_string(), 200.0),
        ]);

        let first = derive_rows(&snapshot, &supply_map);
        let second = derive_rows(&snapshot, &supply_map);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
