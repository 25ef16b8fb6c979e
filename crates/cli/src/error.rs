#![forbid(unsafe_code)]

use crate::signals::SignalEvent;
use flume::SendError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("Failed to send signal event: {0}")]
    SendSignal(#[from] SendError<SignalEvent>),

    #[error("Invalid command `{line}`: {reason}")]
    InvalidCommand { line: String, reason: String },

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to load config: {0}")]
    Config(#[from] config::Error),

    #[error("Prefetch failed: {0}")]
    Slots(#[from] slots::Error),
}
