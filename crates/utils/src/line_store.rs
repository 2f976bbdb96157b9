use std::{
    collections::VecDeque,
    sync::RwLock,
};

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

// 8 MB history budget per store; one store lives only as long as one
// selection, so this bounds worst-case memory for very chatty steps.
const HISTORY_BYTES: usize = 8 * 1024 * 1024;

/// One event in the visible log buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// A log line, already normalized to end with a single newline.
    Line(String),
    /// An informational message shown inline in the view.
    Notice(String),
    /// The producing side finished; no further events will arrive.
    Finished,
}

impl LineEvent {
    fn approx_bytes(&self) -> usize {
        const OVERHEAD: usize = 8;
        match self {
            LineEvent::Line(s) | LineEvent::Notice(s) => s.len() + OVERHEAD,
            LineEvent::Finished => OVERHEAD,
        }
    }
}

struct StoredEvent {
    event: LineEvent,
    bytes: usize,
}

struct Inner {
    history: VecDeque<StoredEvent>,
    total_bytes: usize,
}

/// History plus live fan-out buffer backing the log view.
///
/// Producers push lines as they arrive; the renderer snapshots the history
/// each frame, and late subscribers replay the history before continuing
/// with live events so nothing is missed mid-reconciliation.
pub struct LineStore {
    inner: RwLock<Inner>,
    sender: broadcast::Sender<LineEvent>,
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LineStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(4096);
        Self {
            inner: RwLock::new(Inner {
                history: VecDeque::with_capacity(32),
                total_bytes: 0,
            }),
            sender,
        }
    }

    pub fn push(&self, event: LineEvent) {
        let _ = self.sender.send(event.clone()); // live listeners
        let bytes = event.approx_bytes();

        let mut inner = self.inner.write().unwrap();
        while inner.total_bytes.saturating_add(bytes) > HISTORY_BYTES {
            if let Some(front) = inner.history.pop_front() {
                inner.total_bytes = inner.total_bytes.saturating_sub(front.bytes);
            } else {
                break;
            }
        }
        inner.history.push_back(StoredEvent { event, bytes });
        inner.total_bytes = inner.total_bytes.saturating_add(bytes);
    }

    // Convenience
    pub fn push_line<S: Into<String>>(&self, s: S) {
        self.push(LineEvent::Line(s.into()));
    }

    pub fn push_notice<S: Into<String>>(&self, s: S) {
        self.push(LineEvent::Notice(s.into()));
    }

    pub fn push_finished(&self) {
        self.push(LineEvent::Finished);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LineEvent> {
        self.sender.subscribe()
    }

    pub fn history(&self) -> Vec<LineEvent> {
        self.inner
            .read()
            .unwrap()
            .history
            .iter()
            .map(|s| s.event.clone())
            .collect()
    }

    /// Snapshot of the renderable text (lines and notices, in order).
    pub fn lines(&self) -> Vec<String> {
        self.history()
            .into_iter()
            .filter_map(|event| match event {
                LineEvent::Line(s) | LineEvent::Notice(s) => Some(s),
                LineEvent::Finished => None,
            })
            .collect()
    }

    /// History then live, as one continuous stream.
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, LineEvent> {
        let (history, rx) = (self.history(), self.subscribe());

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}
