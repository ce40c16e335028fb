//! Log relay: copy a remote log stream to the user's terminal.
//!
//! A [`LogSource`] turns a URL into a stream of byte chunks. The
//! [`StreamingRelay`] copies those chunks verbatim to its output, flushing as
//! it goes, and returns only once the producer closes the stream.

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{BoxError, RelayError};

/// Chunks of an open log stream.
pub type LogChunks = BoxStream<'static, Result<Vec<u8>, BoxError>>;

#[async_trait]
pub trait LogSource: Send + Sync {
    async fn open(&self, url: &str) -> Result<LogChunks, BoxError>;
}

/// Reads a log stream as a chunked HTTP response body.
pub struct HttpLogSource {
    http: reqwest::Client,
}

impl HttpLogSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn open(&self, url: &str) -> Result<LogChunks, BoxError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(BoxError::from))
            .boxed())
    }
}

#[async_trait]
pub trait LogRelay: Send + Sync {
    /// Stream `url` to the output. Returns when the producer closes the stream.
    async fn stream(&self, url: &str) -> Result<(), RelayError>;
}

pub struct StreamingRelay<S, W> {
    source: S,
    output: Mutex<W>,
}

impl<S, W> StreamingRelay<S, W> {
    pub fn new(source: S, output: W) -> Self {
        Self {
            source,
            output: Mutex::new(output),
        }
    }

    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

impl StreamingRelay<HttpLogSource, tokio::io::Stdout> {
    pub fn stdout(http: reqwest::Client) -> Self {
        Self::new(HttpLogSource::new(http), tokio::io::stdout())
    }
}

#[async_trait]
impl<S, W> LogRelay for StreamingRelay<S, W>
where
    S: LogSource,
    W: AsyncWrite + Unpin + Send,
{
    async fn stream(&self, url: &str) -> Result<(), RelayError> {
        debug!(url, "opening log stream");
        let mut chunks = self.source.open(url).await.map_err(|source| RelayError::Open {
            url: url.to_string(),
            source,
        })?;

        let mut output = self.output.lock().await;
        let mut copied = 0usize;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(RelayError::Read)?;
            output.write_all(&chunk).await.map_err(RelayError::Write)?;
            output.flush().await.map_err(RelayError::Write)?;
            copied += chunk.len();
        }

        debug!(url, bytes = copied, "log stream closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    /// Serves fixed chunks, optionally failing to open or failing mid-stream.
    enum FakeSource {
        Chunks(Vec<&'static str>),
        RefuseOpen,
        BreakAfter(Vec<&'static str>),
    }

    #[async_trait]
    impl LogSource for FakeSource {
        async fn open(&self, _url: &str) -> Result<LogChunks, BoxError> {
            match self {
                FakeSource::Chunks(chunks) => {
                    let items: Vec<Result<Vec<u8>, BoxError>> =
                        chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
                    Ok(stream::iter(items).boxed())
                }
                FakeSource::RefuseOpen => Err("401 unauthorized".into()),
                FakeSource::BreakAfter(chunks) => {
                    let mut items: Vec<Result<Vec<u8>, BoxError>> =
                        chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
                    items.push(Err("connection reset".into()));
                    Ok(stream::iter(items).boxed())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_copies_chunks_verbatim() {
        let relay = StreamingRelay::new(
            FakeSource::Chunks(vec!["[stage-1] ", "compiling\n", "\x1b[32mok\x1b[0m\n"]),
            Vec::new(),
        );

        relay.stream("logs://t").await.unwrap();

        assert_eq!(
            relay.into_output(),
            b"[stage-1] compiling\n\x1b[32mok\x1b[0m\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_empty_stream_completes() {
        let relay = StreamingRelay::new(FakeSource::Chunks(Vec::new()), Vec::new());
        relay.stream("logs://t").await.unwrap();
        assert!(relay.into_output().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_names_url() {
        let relay = StreamingRelay::new(FakeSource::RefuseOpen, Vec::new());

        let err = relay.stream("logs://build").await.unwrap_err();

        match &err {
            RelayError::Open { url, source } => {
                assert_eq!(url, "logs://build");
                assert_eq!(source.to_string(), "401 unauthorized");
            }
            other => panic!("Expected Open, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_earlier_output() {
        let relay = StreamingRelay::new(FakeSource::BreakAfter(vec!["line one\n"]), Vec::new());

        let err = relay.stream("logs://t").await.unwrap_err();

        assert!(matches!(err, RelayError::Read(_)));
        assert_eq!(relay.into_output(), b"line one\n".to_vec());
    }

    #[tokio::test]
    async fn test_consecutive_streams_append() {
        let relay = StreamingRelay::new(FakeSource::Chunks(vec!["x\n"]), Vec::new());
        relay.stream("logs://build").await.unwrap();
        relay.stream("logs://test").await.unwrap();
        assert_eq!(relay.into_output(), b"x\nx\n".to_vec());
    }
}
