use clap::Parser;
use config::Config;
use flume::bounded;
use pfslot::{
    cli::Cli,
    commands::Command,
    driver::{Driver, Flow},
    signals::wait_for_signal,
};
use std::{fs::OpenOptions, io, path::Path, sync::Mutex};
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    time::{Instant, sleep},
};
use tracing::{debug, error, warn};
use tracing_log::AsTrace;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

async fn open_input(script: Option<&Path>) -> io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match script {
        Some(path) => Box::new(BufReader::new(File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => Config::new(),
    };

    let level = cli.verbosity.log_level_filter().as_trace();
    match cli.logfile.as_ref().or(config.logging.file.as_ref()) {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(io::stderr)
                .init();
        }
    }

    debug!(?cli, ?config);

    if let Some(path) = &cli.dump_config {
        config.save(path)?;
        return Ok(());
    }

    let (events_tx, events_rx) = flume::unbounded();
    let (signals_tx, signals_rx) = bounded(8);
    let mut driver = Driver::new(&config, cli.conffile.clone(), events_tx);
    let mut lines = open_input(cli.script.as_deref()).await?.lines();

    let signals = wait_for_signal(&signals_tx);
    tokio::pin!(signals);
    let pause = sleep(std::time::Duration::ZERO);
    tokio::pin!(pause);
    let mut paused = false;
    let mut input_done = false;
    let mut stdout = io::stdout();

    loop {
        if input_done && !driver.has_pending() {
            break;
        }
        tokio::select! {
            err = &mut signals => {
                error!(error = ?err, "Error while waiting for signal");
                err?;
                break;
            }
            () = &mut pause, if paused => {
                paused = false;
            }
            line = lines.next_line(), if !paused && !input_done => {
                let Some(line) = line? else {
                    debug!("end of input, waiting for pending prefetches");
                    input_done = true;
                    continue;
                };
                let command = match Command::parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(%err, "skipping line");
                        continue;
                    }
                };
                match driver.execute(command, &mut stdout.lock()) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Pause(duration)) => {
                        pause.as_mut().reset(Instant::now() + duration);
                        paused = true;
                    }
                    Ok(Flow::Quit) => break,
                    Err(err) => error!(%err, "command failed"),
                }
            }
            Ok(event) = events_rx.recv_async() => {
                driver.report_event(&event, &mut stdout.lock())?;
            }
            Ok(signal) = signals_rx.recv_async() => {
                debug!(?signal, "Received signal event");
                if let Err(err) = driver.on_signal(signal, &mut stdout.lock()) {
                    error!(%err, "failed to handle signal");
                }
            }
        }
    }

    for event in events_rx.drain() {
        driver.report_event(&event, &mut stdout.lock())?;
    }
    // releases every held prefetch
    drop(driver);
    Ok(())
}
