#![forbid(unsafe_code)]

use crate::{PrefetchHandle, PrefetchRequest, StatusNotifier};
use std::time::Duration;

/// Why a pipeline could not produce a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFailure {
    Generic,
    /// A prefetch for the same URL is already held.
    Duplicate,
}

/// Produces prefetch handles. Everything past the handle (fetching, header
/// matching, storage, expiry after `ttl`) is the pipeline's business.
pub trait PrefetchPipeline {
    fn start(
        &self,
        request: &PrefetchRequest,
        ttl: Duration,
        notifier: StatusNotifier,
    ) -> Result<Box<dyn PrefetchHandle>, StartFailure>;
}
