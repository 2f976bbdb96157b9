use std::time::Duration;

use api::{
    ApiError,
    models::{Execution, ExecutionDetail, PipelineSummary},
};
use crossterm::event::{Event as TerminalEvent, EventStream, KeyEvent};
use futures::StreamExt;
use services::services::scanner::ScanOutcome;
use tokio::sync::mpsc;

/// Everything the single UI event loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Tick,
    Key(KeyEvent),
    Resize,
    /// A pipeline-list refresh finished.
    Pipelines(Result<Vec<PipelineSummary>, ApiError>),
    /// Execution history for the highlighted pipeline.
    Executions {
        generation: u64,
        result: Result<Vec<Execution>, ApiError>,
    },
    /// Pipeline YAML for the highlighted pipeline.
    Yaml {
        generation: u64,
        result: Result<String, ApiError>,
    },
    /// Node graph of the chosen execution.
    ExecutionGraph {
        generation: u64,
        result: Result<ExecutionDetail, ApiError>,
    },
    /// The log pane has new content; redraw.
    LogActivity,
    /// Transient user-visible notification.
    Toast(String),
    /// A background cache scan finished (or declined to run).
    ScanFinished(ScanOutcome),
}

/// Terminal input and timer events funneled into the app channel.
///
/// Worker tasks clone the sender to push their results into the same
/// channel, keeping the UI loop the single consumer.
pub struct EventHandler {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let input_tx = tx.clone();
        tokio::spawn(async move {
            let mut input = EventStream::new();
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if input_tx.send(AppEvent::Tick).is_err() {
                            break;
                        }
                    }
                    maybe_event = input.next() => match maybe_event {
                        Some(Ok(TerminalEvent::Key(key))) => {
                            if input_tx.send(AppEvent::Key(key)).is_err() {
                                break;
                            }
                        }
                        Some(Ok(TerminalEvent::Resize(..))) => {
                            if input_tx.send(AppEvent::Resize).is_err() {
                                break;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "terminal event stream error");
                        }
                        None => break,
                    }
                }
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Drain without waiting, so bursts coalesce into one redraw.
    pub fn try_next(&mut self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}
