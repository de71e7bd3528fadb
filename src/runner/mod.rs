pub mod events;
pub mod naming;
pub mod reporter;
pub mod state;

use crate::report::ReportTransport;
use crate::utils::config::ReporterConfig;
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;

pub use events::*;
pub use reporter::*;
pub use state::*;

/// How an event stream ended
#[derive(Debug)]
pub enum ReplayOutcome {
    Completed(Completion),
    /// Stream ended without `done`; nothing was reported
    Incomplete(RunSummary),
}

/// Feed a newline-delimited JSON event stream through the reporter.
///
/// Undecodable lines are skipped; a read error ends the stream. The stream is not
/// read past `done`.
pub async fn replay<R: BufRead, T: ReportTransport>(
    mut reader: R,
    reporter: &mut Reporter<T>,
    emitter: &EventEmitter,
) -> ReplayOutcome {
    let mut buf = Vec::new();
    let mut line_no: usize = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => line_no += 1,
            Err(err) => {
                log::warn!("Failed to read event stream after line {}: {}", line_no, err);
                break;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(err) => {
                log::warn!("Skipping non UTF-8 event at line {}: {}", line_no, err);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let event = match RunEvent::from_json_line(line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(err) => {
                log::warn!("Skipping malformed event at line {}: {}", line_no, err);
                continue;
            }
        };

        emitter.emit(event.clone());

        if let Some(completion) = reporter.dispatch(&event).await {
            return ReplayOutcome::Completed(completion);
        }
    }

    log::warn!("Event stream ended before 'done'; no report sent");
    ReplayOutcome::Incomplete(reporter.summary())
}

/// Replay events from a file (or stdin when `events` is `None` or `-`) and report the run
pub async fn run_reporter(
    events: Option<&Path>,
    config: ReporterConfig,
    mode: DeliveryMode,
    quiet: bool,
) -> Result<ReplayOutcome> {
    let mut reporter = Reporter::http(config.into_context(), mode);

    let reader: Box<dyn BufRead> = match events {
        Some(path) if path != Path::new("-") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open event stream: {}", path.display()))?;
            Box::new(std::io::BufReader::new(file))
        }
        _ => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    let (emitter, receiver) = EventEmitter::new();
    let listener = if quiet {
        drop(receiver);
        None
    } else {
        Some(tokio::spawn(ConsoleEventListener::listen(receiver)))
    };

    let outcome = replay(reader, &mut reporter, &emitter).await;

    drop(emitter);
    if let Some(listener) = listener {
        let _ = listener.await;
    }

    Ok(outcome)
}
