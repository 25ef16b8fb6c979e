#![forbid(unsafe_code)]

use crate::{
    Error,
    commands::{Command, HELP},
    fetcher::SimulatedFetcher,
    signals::SignalEvent,
};
use config::Config;
use flume::Sender;
use slots::{
    PrefetchEvent, PrefetchEventKind, PrefetchManager, PrefetchStatus, StatusNotifier,
    TaskPipeline,
};
use std::{io::Write, path::PathBuf, time::Duration};
use tracing::{debug, info};

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop reading input for the given time, still reporting events.
    Pause(Duration),
    Quit,
}

/// Runs commands against a prefetch manager and renders the results.
#[derive(Debug)]
pub struct Driver {
    manager: PrefetchManager<TaskPipeline<SimulatedFetcher>>,
    events: Sender<PrefetchEvent>,
    conffile: Option<PathBuf>,
}

impl Driver {
    pub fn new(config: &Config, conffile: Option<PathBuf>, events: Sender<PrefetchEvent>) -> Self {
        let pipeline = TaskPipeline::new(SimulatedFetcher::new(&config.fetch));
        Self {
            manager: PrefetchManager::new(pipeline, &config.prefetch),
            events,
            conffile,
        }
    }

    pub fn manager(&self) -> &PrefetchManager<TaskPipeline<SimulatedFetcher>> {
        &self.manager
    }

    /// Whether a started prefetch is still waiting for its response.
    pub fn has_pending(&self) -> bool {
        self.manager.pipeline().pending() > 0
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<Flow, Error> {
        debug!(?command, "executing command");
        match command {
            Command::Start(request) => {
                let notifier = StatusNotifier::new(&request.url, self.events.clone());
                let url = request.url.clone();
                let key = self.manager.start_prefetch(request, notifier)?;
                if key.is_none() {
                    writeln!(out, "{url}: not started (key {key})")?;
                } else {
                    writeln!(out, "{url}: started with key {key}")?;
                }
            }
            Command::Cancel(key) => {
                let held = self.manager.is_prefetch_in_cache(key);
                self.manager.cancel_prefetch(key);
                if held {
                    writeln!(out, "cancelled {key}")?;
                } else {
                    writeln!(out, "nothing to cancel for {key}")?;
                }
            }
            Command::Configure {
                ttl_secs,
                max_slots,
            } => {
                self.manager.update_configuration(ttl_secs, max_slots);
                self.write_settings(out)?;
            }
            Command::SetTtl(ttl_secs) => {
                self.manager.set_ttl_secs(ttl_secs);
                self.write_settings(out)?;
            }
            Command::SetMaxSlots(max_slots) => {
                self.manager.set_max_slots(max_slots);
                self.write_settings(out)?;
            }
            Command::List => self.dump(out)?,
            Command::Wait(duration) => return Ok(Flow::Pause(duration)),
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    pub fn report_event(&self, event: &PrefetchEvent, out: &mut impl Write) -> Result<(), Error> {
        let url = &event.url;
        match &event.kind {
            PrefetchEventKind::Error(err) => writeln!(out, "{url}: rejected: {err}")?,
            PrefetchEventKind::Status(status) => {
                let text = match status {
                    PrefetchStatus::StartFailed => "failed to start".to_owned(),
                    PrefetchStatus::StartFailedDuplicate => "already being prefetched".to_owned(),
                    PrefetchStatus::ResponseCompleted => "completed".to_owned(),
                    PrefetchStatus::ResponseGenericError => "failed".to_owned(),
                    PrefetchStatus::ResponseServerError { http_response_code } => {
                        format!("server answered {http_response_code}")
                    }
                };
                writeln!(out, "{url}: {text}")?;
            }
        }
        Ok(())
    }

    pub fn on_signal(&mut self, signal: SignalEvent, out: &mut impl Write) -> Result<(), Error> {
        match signal {
            SignalEvent::DumpSlots => self.dump(out),
            SignalEvent::ReloadConfig => self.reload(),
        }
    }

    /// Re-read the config file, if there is one, and apply its prefetch
    /// settings. Held prefetches are kept.
    pub fn reload(&mut self) -> Result<(), Error> {
        let Some(path) = &self.conffile else {
            info!("no config file to reload");
            return Ok(());
        };
        let config = Config::load(path)?;
        self.manager.apply_settings(&config.prefetch);
        info!(path = %path.display(), prefetch = ?config.prefetch, "config reloaded");
        Ok(())
    }

    fn write_settings(&self, out: &mut impl Write) -> Result<(), Error> {
        writeln!(
            out,
            "ttl={}s max_slots={}",
            self.manager.ttl_secs(),
            self.manager.max_slots()
        )?;
        Ok(())
    }

    fn dump(&self, out: &mut impl Write) -> Result<(), Error> {
        let slots = self.manager.slots();
        writeln!(
            out,
            "{} of {} slots used, ttl={}s, last key {}",
            slots.len(),
            slots.max_slots(),
            slots.ttl_secs(),
            slots.last_key()
        )?;
        for (key, handle) in slots.handles() {
            writeln!(out, "  {key:>3} {handle:?}")?;
        }
        Ok(())
    }
}
