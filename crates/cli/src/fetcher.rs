#![forbid(unsafe_code)]

use async_trait::async_trait;
use config::Fetch;
use slots::{FetchError, Fetcher, PrefetchRequest};
use std::time::Duration;
use tracing::trace;

/// Stands in for the network: waits `latency` and answers `status`.
#[derive(Debug, Clone)]
pub struct SimulatedFetcher {
    latency: Duration,
    status: u16,
}

impl SimulatedFetcher {
    pub fn new(settings: &Fetch) -> Self {
        Self {
            latency: settings.latency,
            status: settings.status,
        }
    }
}

#[async_trait]
impl Fetcher for SimulatedFetcher {
    async fn fetch(&self, request: &PrefetchRequest) -> Result<u16, FetchError> {
        let headers = request
            .params
            .as_ref()
            .map_or(0, |params| params.additional_headers.len());
        trace!(url = %request.url, headers, latency = ?self.latency, "simulating fetch");
        tokio::time::sleep(self.latency).await;
        Ok(self.status)
    }
}
