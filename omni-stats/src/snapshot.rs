//! Serde schema for the Omni stats payload.
//!
//! The endpoint is loosely typed: numeric fields occasionally arrive as
//! strings or are missing outright, and `open_interest` is sometimes not an
//! object at all. Every per-listing field is therefore deserialized leniently
//! (missing/invalid -> 0.0) so one malformed listing never aborts the batch.
//! Only an unparseable top-level envelope is fatal to a render cycle.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One fetched payload: global aggregate stats plus per-instrument listings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarketSnapshot {
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub total_volume_24h: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub cumulative_volume: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub tvl: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub open_interest: f64,
    #[serde(default)]
    pub listings: Vec<Listing>,
}

/// Per-instrument listing from the stats endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Listing {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub mark_price: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub volume_24h: f64,
    /// Annualized funding rate as a signed fraction (0.0876 = 8.76% p.a.).
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub funding_rate: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub base_spread_bps: f64,
    #[serde(default, deserialize_with = "de_open_interest")]
    pub open_interest: OpenInterestSides,
}

/// Long/short open interest for one listing.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct OpenInterestSides {
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub long_open_interest: f64,
    #[serde(default, deserialize_with = "de_f64_lenient")]
    pub short_open_interest: f64,
}

/// Accept a JSON number, numeric string, or anything else (-> 0.0).
fn de_f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

/// Accept an `open_interest` object, or any other shape (-> zero both sides).
fn de_open_interest<'de, D>(deserializer: D) -> Result<OpenInterestSides, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => OpenInterestSides {
            long_open_interest: map.get("long_open_interest").map(value_to_f64).unwrap_or(0.0),
            short_open_interest: map
                .get("short_open_interest")
                .map(value_to_f64)
                .unwrap_or(0.0),
        },
        _ => OpenInterestSides::default(),
    })
}

fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_missing_fields_default_to_zero() {
        let snapshot: MarketSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.total_volume_24h, 0.0);
        assert_eq!(snapshot.cumulative_volume, 0.0);
        assert_eq!(snapshot.tvl, 0.0);
        assert_eq!(snapshot.open_interest, 0.0);
        assert!(snapshot.listings.is_empty());
    }

    #[test]
    fn test_listing_numeric_strings_are_accepted() {
        let listing: Listing = serde_json::from_str(
            r#"{"ticker":"BTC","name":"Bitcoin","mark_price":"97000.5","volume_24h":1000}"#,
        )
        .unwrap();
        assert_eq!(listing.mark_price, 97000.5);
        assert_eq!(listing.volume_24h, 1000.0);
    }

    #[test]
    fn test_listing_garbage_numeric_field_becomes_zero() {
        let listing: Listing =
            serde_json::from_str(r#"{"ticker":"X","funding_rate":{"oops":true}}"#).unwrap();
        assert_eq!(listing.funding_rate, 0.0);
    }

    #[test]
    fn test_open_interest_wrong_shape_yields_zero_sides() {
        let listing: Listing =
            serde_json::from_str(r#"{"ticker":"X","open_interest":123.0}"#).unwrap();
        assert_eq!(listing.open_interest, OpenInterestSides::default());

        let listing: Listing =
            serde_json::from_str(r#"{"ticker":"X","open_interest":null}"#).unwrap();
        assert_eq!(listing.open_interest.long_open_interest, 0.0);
        assert_eq!(listing.open_interest.short_open_interest, 0.0);
    }

    #[test]
    fn test_open_interest_object_parses_both_sides() {
        let listing: Listing = serde_json::from_str(
            r#"{"ticker":"X","open_interest":{"long_open_interest":100.0,"short_open_interest":50.0}}"#,
        )
        .unwrap();
        assert_eq!(listing.open_interest.long_open_interest, 100.0);
        assert_eq!(listing.open_interest.short_open_interest, 50.0);
    }

    #[test]
    fn test_full_envelope_parses() {
        let raw = r#"{
            "total_volume_24h": 1000000.0,
            "cumulative_volume": "2000000",
            "tvl": 3000000.0,
            "open_interest": 400000.0,
            "listings": [
                {
                    "ticker": "eth",
                    "name": "Ethereum",
                    "mark_price": 3500.0,
                    "volume_24h": 42.0,
                    "funding_rate": 0.0876,
                    "base_spread_bps": 2.5,
                    "open_interest": {"long_open_interest": 10.0, "short_open_interest": 20.0}
                }
            ]
        }"#;
        let snapshot: MarketSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.cumulative_volume, 2_000_000.0);
        assert_eq!(snapshot.listings.len(), 1);
        assert_eq!(snapshot.listings[0].funding_rate, 0.0876);
    }
}
