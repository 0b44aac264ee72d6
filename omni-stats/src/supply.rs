//! Token supply table: CSV loader and the process-wide cache.
//!
//! The supply file is a date-stamped snapshot with at minimum `Ticker` and
//! `Supply` columns. A missing or unreadable file is recoverable: the loader
//! returns an empty map and every FDV downstream becomes "unknown".

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default cache lifetime for the supply table.
pub const DEFAULT_SUPPLY_TTL: Duration = Duration::from_secs(3600);

/// Normalize a ticker into the shared join key space (trim + uppercase).
///
/// Both the supply loader and the metric engine go through this, so joins
/// always match regardless of source casing.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[derive(Debug, Deserialize)]
struct SupplyRow {
    #[serde(rename = "Ticker")]
    ticker: String,
    /// Kept as text so a non-numeric cell coerces to 0 instead of failing the row.
    #[serde(rename = "Supply")]
    supply: String,
}

/// Load the supply CSV into a ticker -> circulating supply map.
///
/// Never fails: unreadable file or header yields an empty map with a
/// diagnostic, bad rows are skipped, non-numeric supply coerces to 0, and
/// duplicate tickers are last-write-wins.
pub fn load_supply_table(path: &Path) -> HashMap<String, f64> {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(error) => {
            warn!(path = %path.display(), %error, "supply table unavailable, FDV will be unknown");
            return HashMap::new();
        }
    };

    let mut supply_map = HashMap::new();
    for record in reader.deserialize::<SupplyRow>() {
        let row = match record {
            Ok(row) => row,
            Err(error) => {
                debug!(%error, "skipping malformed supply row");
                continue;
            }
        };
        let supply = row.supply.trim().parse::<f64>().unwrap_or(0.0);
        supply_map.insert(normalize_ticker(&row.ticker), supply);
    }

    debug!(entries = supply_map.len(), path = %path.display(), "supply table loaded");
    supply_map
}

struct CachedSupply {
    map: Arc<HashMap<String, f64>>,
    loaded_at: Instant,
}

/// Process-wide supply table cache with a TTL and an explicit invalidate.
///
/// The map is replaced wholesale on reload, never mutated in place, so
/// concurrent readers only ever see a complete table.
pub struct SupplyCache {
    path: PathBuf,
    ttl: Duration,
    inner: RwLock<Option<CachedSupply>>,
}

impl SupplyCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Current supply table, reloading from disk on first use or TTL expiry.
    pub fn get(&self) -> Arc<HashMap<String, f64>> {
        if let Some(cached) = self.inner.read().as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Arc::clone(&cached.map);
            }
        }

        let mut guard = self.inner.write();
        // Another caller may have reloaded while we waited for the write lock.
        if let Some(cached) = guard.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Arc::clone(&cached.map);
            }
        }

        let map = Arc::new(load_supply_table(&self.path));
        *guard = Some(CachedSupply {
            map: Arc::clone(&map),
            loaded_at: Instant::now(),
        });
        map
    }

    /// Drop the cached table; the next `get` reloads from disk.
    pub fn invalidate(&self) {
        *self.inner.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "omni-supply-{name}-{}.csv",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_normalizes_tickers_and_coerces_supply() {
        let path = write_temp_csv(
            "normalize",
            "Ticker,Supply\n btc ,21000000\nETH,120000000\nBAD,not-a-number\n",
        );
        let map = load_supply_table(&path);
        assert_eq!(map.get("BTC"), Some(&21_000_000.0));
        assert_eq!(map.get("ETH"), Some(&120_000_000.0));
        assert_eq!(map.get("BAD"), Some(&0.0));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_duplicate_ticker_last_write_wins() {
        let path = write_temp_csv("dupes", "Ticker,Supply\nSOL,100\nsol,200\n");
        let map = load_supply_table(&path);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("SOL"), Some(&200.0));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_returns_empty_map() {
        let map = load_supply_table(Path::new("/nonexistent/TotalSupply.csv"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_cache_serves_until_invalidated() {
        let path = write_temp_csv("cache", "Ticker,Supply\nBTC,100\n");
        let cache = SupplyCache::new(&path, Duration::from_secs(3600));
        assert_eq!(cache.get().get("BTC"), Some(&100.0));

        // Rewrite the file; the cached copy must still be served.
        std::fs::write(&path, "Ticker,Supply\nBTC,999\n").unwrap();
        assert_eq!(cache.get().get("BTC"), Some(&100.0));

        cache.invalidate();
        assert_eq!(cache.get().get("BTC"), Some(&999.0));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_cache_expires_after_ttl() {
        let path = write_temp_csv("ttl", "Ticker,Supply\nBTC,100\n");
        let cache = SupplyCache::new(&path, Duration::from_millis(0));
        assert_eq!(cache.get().get("BTC"), Some(&100.0));

        std::fs::write(&path, "Ticker,Supply\nBTC,250\n").unwrap();
        assert_eq!(cache.get().get("BTC"), Some(&250.0));
        std::fs::remove_file(&path).ok();
    }
}
