#![forbid(unsafe_code)]

use std::fmt;

/// An in-flight or completed prefetch, exclusively owned by whoever holds it.
///
/// Dropping the handle releases it: the implementation must cancel any work
/// still pending for it.
pub trait PrefetchHandle: fmt::Debug {
    /// URL being prefetched. Diagnostic only.
    fn url(&self) -> &str;
}
