use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    client::LogClient,
    error::{StreamError, TransportError},
    key::LogKey,
    line::LogLine,
};

/// The two transports available for one log key.
///
/// Trait seam so the reconciler and the background scanner can run against
/// fakes in tests.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Finite, eager fetch of the full historical content.
    async fn blob(&self, key: &LogKey) -> Result<Vec<LogLine>, TransportError>;

    /// Lazy live feed; ends on the service's terminal marker.
    async fn stream(&self, key: &LogKey) -> BoxStream<'static, Result<LogLine, StreamError>>;
}

#[async_trait]
impl LogSource for LogClient {
    async fn blob(&self, key: &LogKey) -> Result<Vec<LogLine>, TransportError> {
        LogClient::blob(self, key).await
    }

    async fn stream(&self, key: &LogKey) -> BoxStream<'static, Result<LogLine, StreamError>> {
        LogClient::stream(self, key).await
    }
}
