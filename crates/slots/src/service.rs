#![forbid(unsafe_code)]

use crate::{
    Error, PrefetchPipeline, PrefetchRequest, PrefetchSlotManager, PrefetchStatus, SlotKey,
    StartFailure, StatusNotifier,
};
use config::Prefetch;
use std::time::Duration;
use tracing::{debug, info_span, warn};

/// Front door for embedders: validates requests, asks the pipeline for a
/// handle and keeps it in a [`PrefetchSlotManager`].
#[derive(Debug)]
pub struct PrefetchManager<P> {
    pipeline: P,
    slots: PrefetchSlotManager,
    triggers_enabled: bool,
}

impl<P: PrefetchPipeline> PrefetchManager<P> {
    pub fn new(pipeline: P, settings: &Prefetch) -> Self {
        Self {
            pipeline,
            slots: PrefetchSlotManager::new(settings),
            triggers_enabled: settings.browser_initiated_triggers,
        }
    }

    /// Start prefetching `request` and return the key to cancel it with.
    ///
    /// Returns [`SlotKey::NONE`] when the request is invalid or the pipeline
    /// refuses it; `notifier` learns why and the slot table is unchanged.
    pub fn start_prefetch(
        &mut self,
        request: PrefetchRequest,
        notifier: StatusNotifier,
    ) -> Result<SlotKey, Error> {
        let span = info_span!("prefetch.start", url = %request.url);
        let _enter = span.enter();

        if let Err(err) = request.validate(self.triggers_enabled) {
            debug!(%err, "prefetch request rejected");
            notifier.error(err);
            return Ok(SlotKey::NONE);
        }

        let handle = match self.pipeline.start(&request, self.ttl(), notifier.clone()) {
            Ok(handle) => handle,
            Err(failure) => {
                warn!(?failure, "prefetch failed to start");
                notifier.status(match failure {
                    StartFailure::Generic => PrefetchStatus::StartFailed,
                    StartFailure::Duplicate => PrefetchStatus::StartFailedDuplicate,
                });
                return Ok(SlotKey::NONE);
            }
        };

        self.slots.insert(handle)
    }

    pub fn cancel_prefetch(&mut self, key: SlotKey) {
        self.slots.cancel(key);
    }

    pub fn is_prefetch_in_cache(&self, key: SlotKey) -> bool {
        self.slots.contains(key)
    }

    /// Apply settings coming from the embedder. Non-positive values leave the
    /// corresponding setting unchanged.
    pub fn update_configuration(&mut self, ttl_secs: i32, max_slots: i32) {
        if ttl_secs > 0 {
            self.slots.set_ttl_secs(ttl_secs);
        }
        if max_slots > 0 {
            self.slots.set_max_slots(max_slots);
        }
        debug!(
            ttl_secs = self.slots.ttl_secs(),
            max_slots = self.slots.max_slots(),
            "prefetch configuration updated"
        );
    }

    /// Replace every setting, including the feature switch. Values go through
    /// the unvalidated setters.
    pub fn apply_settings(&mut self, settings: &Prefetch) {
        self.slots.set_ttl_secs(settings.ttl_secs);
        self.slots.set_max_slots(settings.max_slots);
        self.triggers_enabled = settings.browser_initiated_triggers;
    }

    pub fn ttl_secs(&self) -> i32 {
        self.slots.ttl_secs()
    }

    pub fn set_ttl_secs(&mut self, ttl_secs: i32) {
        self.slots.set_ttl_secs(ttl_secs);
    }

    pub fn max_slots(&self) -> i32 {
        self.slots.max_slots()
    }

    pub fn set_max_slots(&mut self, max_slots: i32) {
        self.slots.set_max_slots(max_slots);
    }

    pub fn slots(&self) -> &PrefetchSlotManager {
        &self.slots
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.slots.ttl_secs().max(0) as u64)
    }
}
