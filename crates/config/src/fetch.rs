#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// Behaviour of the simulated fetcher used by the `pfslot` binary.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Fetch {
    /// Latency of the simulated fetcher, in milliseconds.
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub latency: Duration,

    /// Status code reported by the simulated fetcher.
    pub status: u16,
}

impl Default for Fetch {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(250),
            status: 200,
        }
    }
}
