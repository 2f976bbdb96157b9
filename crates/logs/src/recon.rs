//! Reconciliation of the two log transports into one display sequence.
//!
//! The stream is attempted first: for a completed execution it ends almost
//! immediately with EOF and the blob supplies the history; for a running
//! execution it supplies live lines and the blob afterwards backstops
//! anything the stream missed. Lines duplicated across the two sources are
//! delivered as-is; the view is append-only and tolerates them.

use std::sync::Arc;

use async_stream::stream;
use futures::{StreamExt, stream::BoxStream};

use crate::{error::TransportError, key::LogKey, source::LogSource};

/// Shown instead of an empty pane when neither source has content.
pub const NO_LOGS_SENTINEL: &str = "No logs to display for the given key.\n";

/// Merge the live stream and the blob fallback for `key` into one lazy
/// two-stage sequence of normalized text chunks (each ending in exactly one
/// newline).
///
/// Ordering: all stream lines, then all blob lines, each segment in source
/// order. A stream error is swallowed (the blob is independently
/// authoritative); a blob error is yielded to the caller since there is no
/// further fallback. If neither source produces a line, a single
/// [`NO_LOGS_SENTINEL`] chunk is emitted so the viewer is never blank.
pub fn reconcile(
    source: Arc<dyn LogSource>,
    key: LogKey,
) -> BoxStream<'static, Result<String, TransportError>> {
    Box::pin(stream! {
        let mut produced = false;

        // Stage one: the live stream, until its terminal marker.
        let mut live = source.stream(&key).await;
        while let Some(item) = live.next().await {
            match item {
                Ok(line) => {
                    produced = true;
                    yield Ok(line.normalized());
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "log stream ended with error, falling back to blob");
                    break;
                }
            }
        }
        drop(live);

        // Stage two: the blob fallback. Its failure is the caller's problem.
        match source.blob(&key).await {
            Ok(lines) => {
                for line in &lines {
                    produced = true;
                    yield Ok(line.normalized());
                }
                if !produced {
                    yield Ok(NO_LOGS_SENTINEL.to_string());
                }
            }
            Err(e) => {
                yield Err(e);
            }
        }
    })
}
