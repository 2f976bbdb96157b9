//! Reconciler behavior against a scripted log source.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use logs::{LogKey, LogLine, LogSource, NO_LOGS_SENTINEL, StreamError, TransportError, reconcile};

fn line(out: &str) -> LogLine {
    serde_json::from_str(&format!(r#"{{"out":{}}}"#, serde_json::json!(out))).unwrap()
}

/// Scripted source: a fixed stream transcript and a fixed blob outcome.
struct FakeSource {
    stream_items: Vec<Result<LogLine, StreamError>>,
    blob_outcome: Result<Vec<LogLine>, TransportError>,
    blob_calls: AtomicUsize,
}

impl FakeSource {
    fn new(
        stream_items: Vec<Result<LogLine, StreamError>>,
        blob_outcome: Result<Vec<LogLine>, TransportError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            stream_items,
            blob_outcome,
            blob_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LogSource for FakeSource {
    async fn blob(&self, _key: &LogKey) -> Result<Vec<LogLine>, TransportError> {
        self.blob_calls.fetch_add(1, Ordering::SeqCst);
        match &self.blob_outcome {
            Ok(lines) => Ok(lines.clone()),
            Err(TransportError::Status { status, body }) => Err(TransportError::Status {
                status: *status,
                body: body.clone(),
            }),
            Err(_) => unreachable!("fakes only script status errors"),
        }
    }

    async fn stream(&self, _key: &LogKey) -> BoxStream<'static, Result<LogLine, StreamError>> {
        let items: Vec<_> = self
            .stream_items
            .iter()
            .map(|item| match item {
                Ok(line) => Ok(line.clone()),
                Err(StreamError::Remote(msg)) => Err(StreamError::Remote(msg.clone())),
                Err(StreamError::Transport(msg)) => Err(StreamError::Transport(msg.clone())),
                Err(_) => unreachable!("fakes only script remote/transport errors"),
            })
            .collect();
        futures::stream::iter(items).boxed()
    }
}

fn key() -> LogKey {
    LogKey::new("accountId:a1/orgId:o1/projectId:p1/pipelineId:pipe/runSequence:3/level0:pipeline")
}

#[tokio::test]
async fn blob_only_content_is_delivered_in_order() {
    let source = FakeSource::new(vec![], Ok(vec![line("line1"), line("line2\n")]));

    let chunks: Vec<String> = reconcile(source.clone(), key())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks, vec!["line1\n", "line2\n"]);
}

#[tokio::test]
async fn stream_lines_come_before_blob_lines_with_duplicates_preserved() {
    let source = FakeSource::new(
        vec![Ok(line("live1")), Ok(line("live2"))],
        Ok(vec![line("live1"), line("hist1")]),
    );

    let chunks: Vec<String> = reconcile(source.clone(), key())
        .try_collect()
        .await
        .unwrap();

    // The blob backstop repeats live1; no deduplication happens.
    assert_eq!(chunks, vec!["live1\n", "live2\n", "live1\n", "hist1\n"]);
}

#[tokio::test]
async fn both_sources_empty_yields_exactly_one_sentinel_line() {
    let source = FakeSource::new(vec![], Ok(vec![]));

    let chunks: Vec<String> = reconcile(source.clone(), key())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks, vec![NO_LOGS_SENTINEL]);
}

#[tokio::test]
async fn mid_stream_error_is_swallowed_and_blob_still_fetched() {
    let source = FakeSource::new(
        vec![
            Ok(line("before")),
            Err(StreamError::Remote("stream exploded".into())),
            // Never reached; the reconciler stops consuming on the error.
            Ok(line("after")),
        ],
        Ok(vec![line("hist1")]),
    );

    let chunks: Vec<String> = reconcile(source.clone(), key())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks, vec!["before\n", "hist1\n"]);
    assert_eq!(source.blob_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_error_with_empty_blob_yields_sentinel() {
    let source = FakeSource::new(
        vec![Err(StreamError::Transport("connection reset".into()))],
        Ok(vec![]),
    );

    let chunks: Vec<String> = reconcile(source.clone(), key())
        .try_collect()
        .await
        .unwrap();

    assert_eq!(chunks, vec![NO_LOGS_SENTINEL]);
}

#[tokio::test]
async fn blob_failure_propagates_to_the_caller() {
    let source = FakeSource::new(
        vec![Ok(line("live1"))],
        Err(TransportError::Status {
            status: 500,
            body: "boom".into(),
        }),
    );

    let mut stream = reconcile(source.clone(), key());

    assert_eq!(stream.next().await.unwrap().unwrap(), "live1\n");
    match stream.next().await.unwrap() {
        Err(TransportError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected propagated blob error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}
