#![forbid(unsafe_code)]

use crate::{
    FetchError, PrefetchHandle, PrefetchPipeline, PrefetchRequest, PrefetchStatus, StartFailure,
    StatusNotifier,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the resource and return the HTTP status code of the response.
    async fn fetch(&self, request: &PrefetchRequest) -> Result<u16, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Pending,
    /// Response stored and within its time-to-live.
    Ready,
    Expired,
    Failed,
    Cancelled,
}

/// URLs with a live (pending or ready) prefetch, tagged with the id of the
/// handle that owns them.
#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    live: HashMap<String, (u64, Arc<Mutex<HandleState>>)>,
}

impl Registry {
    fn claim(&mut self, url: &str, state: &Arc<Mutex<HandleState>>) -> Option<u64> {
        if self.live.contains_key(url) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(url.to_owned(), (id, state.clone()));
        Some(id)
    }

    fn pending(&self) -> usize {
        self.live
            .values()
            .filter(|(_, state)| *state.lock() == HandleState::Pending)
            .count()
    }
}

/// Claim on a URL in the registry. Releasing is idempotent and never frees a
/// URL claimed again by a newer handle.
#[derive(Debug, Clone)]
struct Lease {
    registry: Arc<Mutex<Registry>>,
    url: String,
    id: u64,
}

impl Lease {
    fn release(&self) {
        let mut registry = self.registry.lock();
        if registry.live.get(&self.url).is_some_and(|(id, _)| *id == self.id) {
            registry.live.remove(&self.url);
        }
    }
}

/// Pipeline running each prefetch as a tokio task.
///
/// Only one live handle per URL is allowed at a time. A handle stops being
/// live once its fetch failed or its response expired.
pub struct TaskPipeline<F> {
    fetcher: Arc<F>,
    registry: Arc<Mutex<Registry>>,
}

impl<F> fmt::Debug for TaskPipeline<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPipeline")
            .field("in_flight", &self.registry.lock().live.len())
            .finish_non_exhaustive()
    }
}

impl<F: Fetcher + 'static> TaskPipeline<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            registry: Default::default(),
        }
    }

    /// Number of URLs with a live handle.
    pub fn in_flight(&self) -> usize {
        self.registry.lock().live.len()
    }

    /// Number of prefetches still waiting for their response.
    pub fn pending(&self) -> usize {
        self.registry.lock().pending()
    }

    /// Same as [`PrefetchPipeline::start`] but keeps the concrete handle type.
    pub fn start_task(
        &self,
        request: &PrefetchRequest,
        ttl: Duration,
        notifier: StatusNotifier,
    ) -> Result<TaskHandle, StartFailure> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(url = %request.url, "no tokio runtime to run the prefetch on");
            return Err(StartFailure::Generic);
        };
        let state = Arc::new(Mutex::new(HandleState::Pending));
        let Some(id) = self.registry.lock().claim(&request.url, &state) else {
            return Err(StartFailure::Duplicate);
        };
        let lease = Lease {
            registry: self.registry.clone(),
            url: request.url.clone(),
            id,
        };

        let cancel = CancellationToken::new();
        let span = info_span!("prefetch.fetch", url = %request.url);
        runtime.spawn(
            run_fetch(
                self.fetcher.clone(),
                request.clone(),
                ttl,
                notifier,
                cancel.clone(),
                state.clone(),
                lease.clone(),
            )
            .instrument(span),
        );

        Ok(TaskHandle {
            url: request.url.clone(),
            cancel,
            state,
            lease,
        })
    }
}

impl<F: Fetcher + 'static> PrefetchPipeline for TaskPipeline<F> {
    fn start(
        &self,
        request: &PrefetchRequest,
        ttl: Duration,
        notifier: StatusNotifier,
    ) -> Result<Box<dyn PrefetchHandle>, StartFailure> {
        let handle = self.start_task(request, ttl, notifier)?;
        Ok(Box::new(handle))
    }
}

/// Moves `state` from `from` to `to`; false if it was elsewhere.
fn transition(state: &Mutex<HandleState>, from: HandleState, to: HandleState) -> bool {
    let mut state = state.lock();
    if *state == from {
        *state = to;
        true
    } else {
        false
    }
}

async fn run_fetch<F: Fetcher + ?Sized>(
    fetcher: Arc<F>,
    request: PrefetchRequest,
    ttl: Duration,
    notifier: StatusNotifier,
    cancel: CancellationToken,
    state: Arc<Mutex<HandleState>>,
    lease: Lease,
) {
    let outcome = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("prefetch cancelled while fetching");
            return;
        }
        outcome = fetcher.fetch(&request) => outcome,
    };

    let (next, status) = match outcome {
        Ok(code) if (200..300).contains(&code) => {
            (HandleState::Ready, PrefetchStatus::ResponseCompleted)
        }
        Ok(code) if code >= 400 => (
            HandleState::Failed,
            PrefetchStatus::ResponseServerError {
                http_response_code: code,
            },
        ),
        Ok(code) => {
            warn!(code, "unexpected response status");
            (HandleState::Failed, PrefetchStatus::ResponseGenericError)
        }
        Err(err) => {
            warn!(%err, "prefetch fetch failed");
            (HandleState::Failed, PrefetchStatus::ResponseGenericError)
        }
    };
    {
        let mut current = state.lock();
        if *current != HandleState::Pending {
            return;
        }
        *current = next;
        // sent under the lock: once a handle leaves `Pending` its event is queued
        notifier.status(status);
    }
    if next != HandleState::Ready {
        lease.release();
        return;
    }

    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(ttl) => {
            if transition(&state, HandleState::Ready, HandleState::Expired) {
                lease.release();
                debug!(?ttl, "prefetched response expired");
            }
        }
    }
}

/// Handle of a prefetch run by [`TaskPipeline`]. Dropping it aborts the
/// fetch and frees the URL for a new prefetch.
pub struct TaskHandle {
    url: String,
    cancel: CancellationToken,
    state: Arc<Mutex<HandleState>>,
    lease: Lease,
}

impl TaskHandle {
    pub fn state(&self) -> HandleState {
        *self.state.lock()
    }

    /// A response is stored and still within its time-to-live.
    pub fn is_fresh(&self) -> bool {
        self.state() == HandleState::Ready
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

impl PrefetchHandle for TaskHandle {
    fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        {
            let mut state = self.state.lock();
            if matches!(*state, HandleState::Pending | HandleState::Ready) {
                *state = HandleState::Cancelled;
            }
        }
        self.cancel.cancel();
        self.lease.release();
    }
}
