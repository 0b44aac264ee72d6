//! Error taxonomy for the stats pipeline.
//!
//! Only fetch-level failures are errors: transport problems, timeouts,
//! non-2xx statuses, and an unparseable envelope all abort the render cycle.
//! A missing supply file is recovered inside [`crate::supply`] with a
//! diagnostic, and malformed listing fields are absorbed at the serde
//! boundary, so neither appears here.

use thiserror::Error;

/// All errors surfaced by `omni-stats`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("stats request failed: {0}")]
    Request(String),

    #[error("stats endpoint returned HTTP {0}")]
    Status(u16),

    #[error("malformed stats payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StatsError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Parse(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}
