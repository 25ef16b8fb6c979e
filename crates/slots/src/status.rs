#![forbid(unsafe_code)]

use crate::RequestError;
use flume::Sender;
use tracing::trace;

/// Progress of a prefetch as reported to whoever requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchStatus {
    StartFailed,
    StartFailedDuplicate,
    ResponseCompleted,
    ResponseGenericError,
    ResponseServerError { http_response_code: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchEventKind {
    Status(PrefetchStatus),
    /// The request was refused before it reached the pipeline.
    Error(RequestError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchEvent {
    pub url: String,
    pub kind: PrefetchEventKind,
}

/// Delivers [`PrefetchEvent`]s for one request.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    url: String,
    tx: Sender<PrefetchEvent>,
}

impl StatusNotifier {
    pub fn new(url: impl Into<String>, tx: Sender<PrefetchEvent>) -> Self {
        Self {
            url: url.into(),
            tx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self, status: PrefetchStatus) {
        self.send(PrefetchEventKind::Status(status));
    }

    pub fn error(&self, error: RequestError) {
        self.send(PrefetchEventKind::Error(error));
    }

    fn send(&self, kind: PrefetchEventKind) {
        let event = PrefetchEvent {
            url: self.url.clone(),
            kind,
        };
        // nobody listening anymore is fine
        if let Err(err) = self.tx.send(event) {
            trace!(url = %self.url, event = ?err.into_inner(), "dropped prefetch event");
        }
    }
}
