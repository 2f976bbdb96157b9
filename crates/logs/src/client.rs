use std::time::{Duration, Instant};

use async_stream::stream;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{Client, Response};
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::Mutex;
use url::Url;

use crate::{
    error::{StreamError, TransportError},
    key::LogKey,
    line::LogLine,
};

/// Connection parameters of the log service, built once at startup.
#[derive(Debug, Clone)]
pub struct LogServiceConfig {
    pub base_url: Url,
    pub api_key: String,
    pub account: String,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Client for the log service: short-lived token, one-shot blob fetch and
/// live SSE stream.
///
/// The token cache is the only shared mutable state; everything else is
/// plain network I/O.
pub struct LogClient {
    http: Client,
    config: LogServiceConfig,
    token: Mutex<Option<CachedToken>>,
    token_ttl: Duration,
}

impl std::fmt::Debug for LogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogClient")
            .field("base_url", &self.config.base_url.as_str())
            .field("account", &self.config.account)
            .finish()
    }
}

impl LogClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Tokens are valid for a fixed service-side window.
    const TOKEN_TTL: Duration = Duration::from_secs(300);

    pub fn new(config: LogServiceConfig) -> Self {
        Self::with_token_ttl(config, Self::TOKEN_TTL)
    }

    /// As [`LogClient::new`] but with a custom token lifetime.
    pub fn with_token_ttl(config: LogServiceConfig, token_ttl: Duration) -> Self {
        // The stream endpoint stays open indefinitely, so the client-wide
        // timeout only covers connection establishment.
        let http = Client::builder()
            .connect_timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("pipedeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            config,
            token: Mutex::new(None),
            token_ttl,
        }
    }

    /// The short-lived bearer credential for the blob/stream endpoints.
    ///
    /// Cached as an explicit `(value, expires_at)` pair under one mutex:
    /// repeated calls within the TTL return the cached token without a
    /// network round trip, and the first call after expiry transparently
    /// re-fetches. Holding the mutex across the fetch also keeps concurrent
    /// callers from racing duplicate token requests.
    pub async fn token(&self) -> Result<String, TransportError> {
        let mut slot = self.token.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let token = self.fetch_token().await?;
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + self.token_ttl,
        });
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<String, TransportError> {
        let url = self.config.base_url.join("token")?;
        tracing::debug!(account = %self.config.account, "fetching log service token");
        let response = self
            .http
            .get(url)
            .query(&[("accountID", self.config.account.as_str())])
            .header("x-api-key", &self.config.api_key)
            .timeout(Self::REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    /// One-shot fetch of the full historical log content for a key.
    pub async fn blob(&self, key: &LogKey) -> Result<Vec<LogLine>, TransportError> {
        let token = self.token().await?;
        let url = self.config.base_url.join("blob")?;
        let response = self
            .http
            .get(url)
            .query(&[
                ("accountID", self.config.account.as_str()),
                ("key", key.as_str()),
            ])
            .bearer_auth(token)
            .timeout(Self::REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        parse_blob(&body)
    }

    /// Open the live SSE feed for a key.
    ///
    /// The sequence is lazy and pull-based, restartable per call, and ends
    /// when the service sends its terminal marker: an `error` event whose
    /// payload is `EOF` ends it cleanly, any other `error` payload ends it
    /// with [`StreamError::Remote`]. `ping` heartbeats are discarded.
    pub async fn stream(&self, key: &LogKey) -> BoxStream<'static, Result<LogLine, StreamError>> {
        let token = match self.token().await {
            Ok(token) => token,
            Err(e) => return single_error(StreamError::Transport(e.to_string())),
        };

        let url = match self.stream_url(key) {
            Ok(url) => url,
            Err(e) => return single_error(StreamError::Transport(e.to_string())),
        };

        let request = self.http.get(url).bearer_auth(token);
        let mut source = match EventSource::new(request) {
            Ok(source) => source,
            Err(e) => return single_error(StreamError::Transport(e.to_string())),
        };

        Box::pin(stream! {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => continue,
                    Ok(Event::Message(msg)) => match classify_frame(&msg.event, &msg.data) {
                        SseFrame::Ping => continue,
                        SseFrame::Eof => break,
                        SseFrame::Failed(payload) => {
                            yield Err(StreamError::Remote(payload));
                            break;
                        }
                        SseFrame::Data(payload) => {
                            match serde_json::from_str::<LogLine>(&payload) {
                                Ok(line) => yield Ok(line),
                                Err(e) => {
                                    yield Err(StreamError::Decode(e));
                                    break;
                                }
                            }
                        }
                    },
                    // The connection closed without a terminal marker; the
                    // blob fallback covers whatever was missed.
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        yield Err(StreamError::Transport(e.to_string()));
                        break;
                    }
                }
            }
            source.close();
        })
    }

    fn stream_url(&self, key: &LogKey) -> Result<Url, TransportError> {
        let mut url = self.config.base_url.join("stream")?;
        url.query_pairs_mut()
            .append_pair("accountID", &self.config.account)
            .append_pair("key", key.as_str());
        Ok(url)
    }
}

/// Classification of one SSE frame per the log service protocol.
#[derive(Debug, PartialEq, Eq)]
enum SseFrame {
    Ping,
    Eof,
    Failed(String),
    Data(String),
}

fn classify_frame(event: &str, data: &str) -> SseFrame {
    match event {
        "ping" => SseFrame::Ping,
        "error" => {
            if data.eq_ignore_ascii_case("eof") {
                SseFrame::Eof
            } else {
                SseFrame::Failed(data.to_string())
            }
        }
        _ => SseFrame::Data(data.to_string()),
    }
}

fn single_error(error: StreamError) -> BoxStream<'static, Result<LogLine, StreamError>> {
    futures::stream::iter([Err(error)]).boxed()
}

/// Decode a newline-delimited JSON blob body. Blank lines are skipped.
fn parse_blob(body: &str) -> Result<Vec<LogLine>, TransportError> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(TransportError::from))
        .collect()
}

/// Map a non-2xx response to [`TransportError::Status`], keeping the body
/// for diagnostics.
async fn check_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}
