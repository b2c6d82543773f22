//! Sequential read loop: decode, parse, dispatch.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::decoder::{ChunkDecoder, DecoderConfig};
use super::dispatcher::{DispatchOutcome, Dispatcher, StreamCallbacks};
use super::parser::parse;
use super::session::StreamSession;
use crate::config::FinchatConfig;
use crate::error::{FinchatError, Result};
use crate::normalize::{NormalizerConfig, PayloadNormalizer};
use crate::types::SessionSummary;

/// Owns one session's decoder and state and feeds it to the dispatcher.
///
/// Chunks are handled strictly in arrival order; the only suspension point
/// in [`drive`](Self::drive) is the read of the next chunk.
#[derive(Debug, Default)]
pub struct StreamDriver {
    decoder: ChunkDecoder,
    dispatcher: Dispatcher,
    session: StreamSession,
    idle_timeout: Option<Duration>,
}

impl StreamDriver {
    pub fn new(decoder: DecoderConfig, normalizer: NormalizerConfig) -> Self {
        Self {
            decoder: ChunkDecoder::with_config(decoder),
            dispatcher: Dispatcher::new(PayloadNormalizer::new(normalizer)),
            session: StreamSession::new(),
            idle_timeout: None,
        }
    }

    /// Driver for a configured client. `request_timeout_secs` bounds the
    /// wait for each read, not the whole stream.
    pub fn from_config(config: &FinchatConfig) -> Self {
        Self::new(config.decoder.clone(), config.normalizer.clone())
            .with_idle_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    /// Fail with [`FinchatError::Timeout`] when no read arrives within `limit`.
    pub fn with_idle_timeout(mut self, limit: Duration) -> Self {
        self.idle_timeout = Some(limit);
        self
    }

    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    /// Handle one network read. Returns the summary once the stream is done.
    pub fn push<C>(&mut self, bytes: impl AsRef<[u8]>, callbacks: &mut C) -> Result<Option<SessionSummary>>
    where
        C: StreamCallbacks + ?Sized,
    {
        let records = self.decoder.feed(bytes);
        let total = records.len();
        for (index, record) in records.into_iter().enumerate() {
            let Some(event) = parse(&record) else {
                continue;
            };
            match self.dispatcher.dispatch(&mut self.session, event, callbacks) {
                DispatchOutcome::Continue => {}
                DispatchOutcome::Finished(summary) => {
                    let skipped = total - index - 1;
                    if skipped > 0 {
                        tracing::debug!(records = skipped, "ignoring records after end of stream");
                    }
                    self.decoder.finish();
                    return Ok(Some(summary));
                }
                DispatchOutcome::Failed(message) => {
                    self.abort();
                    return Err(FinchatError::Stream(message));
                }
            }
        }
        Ok(None)
    }

    /// The transport closed without a `StreamDone`. Leftover bytes are
    /// discarded and the session ends incomplete.
    pub fn finish(&mut self) -> SessionSummary {
        self.abort()
    }

    fn abort(&mut self) -> SessionSummary {
        self.decoder.finish();
        self.session.end(false)
    }

    /// Consume a byte stream until it ends, fails, reports `StreamDone` or
    /// `cancel` fires.
    ///
    /// Cancellation is not an error: it yields an incomplete summary.
    pub async fn drive<S, B, E, C>(
        &mut self,
        stream: S,
        callbacks: &mut C,
        cancel: Option<&CancellationToken>,
    ) -> Result<SessionSummary>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        FinchatError: From<E>,
        C: StreamCallbacks + ?Sized,
    {
        futures::pin_mut!(stream);
        let idle = self.idle_timeout;

        loop {
            let next = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("chat stream cancelled");
                        return Ok(self.abort());
                    }
                    item = next_read(&mut stream, idle) => item,
                },
                None => next_read(&mut stream, idle).await,
            };
            let next = match next {
                Ok(item) => item,
                Err(limit) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "chat stream went idle");
                    self.abort();
                    return Err(FinchatError::Timeout(limit.as_millis() as u64));
                }
            };

            match next {
                Some(Ok(bytes)) => {
                    if let Some(summary) = self.push(bytes, callbacks)? {
                        return Ok(summary);
                    }
                }
                Some(Err(e)) => {
                    self.abort();
                    return Err(FinchatError::from(e));
                }
                None => {
                    tracing::debug!("transport closed before end of stream");
                    return Ok(self.finish());
                }
            }
        }
    }
}

/// Next item, or the elapsed limit if the stream stayed silent that long.
async fn next_read<S>(stream: &mut S, idle: Option<Duration>) -> std::result::Result<Option<S::Item>, Duration>
where
    S: Stream + Unpin,
{
    match idle {
        Some(limit) => tokio::time::timeout(limit, stream.next()).await.map_err(|_| limit),
        None => Ok(stream.next().await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Transcript;
    use pretty_assertions::assert_eq;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = std::result::Result<&'static str, FinchatError>> {
        futures::stream::iter(parts.iter().map(|p| Ok(*p)).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn drives_until_done() {
        let mut driver = StreamDriver::default();
        let mut transcript = Transcript::default();
        let summary = driver
            .drive(
                chunks(&[
                    "data: {\"type\":\"token\",\"content\":\"Hel\"}\n",
                    "data: {\"type\":\"token\",\"content\":\"lo\"}\ndata: [DONE]\ndata: {\"type\":\"token\",\"content\":\"!\"}\n",
                ]),
                &mut transcript,
                None,
            )
            .await
            .unwrap();

        assert_eq!(summary.text, "Hello");
        assert!(summary.completed);
        assert_eq!(transcript.text, "Hello");
    }

    #[tokio::test]
    async fn early_close_is_incomplete() {
        let mut driver = StreamDriver::default();
        let mut transcript = Transcript::default();
        let summary = driver
            .drive(
                chunks(&["data: {\"type\":\"token\",\"content\":\"Hi\"}\n", "data: {\"type\":\"tok"]),
                &mut transcript,
                None,
            )
            .await
            .unwrap();

        assert_eq!(summary.text, "Hi");
        assert!(!summary.completed);
    }

    #[tokio::test]
    async fn transport_error_ends_session() {
        let mut driver = StreamDriver::default();
        let mut transcript = Transcript::default();
        let stream = futures::stream::iter(vec![
            Ok("data: {\"type\":\"token\",\"content\":\"Hi\"}\n"),
            Err(FinchatError::Timeout(10)),
            Ok("data: {\"type\":\"token\",\"content\":\"never\"}\n"),
        ]);
        let err = driver.drive(stream, &mut transcript, None).await.unwrap_err();

        assert!(matches!(err, FinchatError::Timeout(10)));
        assert_eq!(transcript.text, "Hi");
        assert_eq!(driver.session().text(), "");
    }

    #[tokio::test]
    async fn server_error_event_becomes_stream_error() {
        let mut driver = StreamDriver::default();
        let mut transcript = Transcript::default();
        let err = driver
            .drive(
                chunks(&["data: {\"type\":\"error\",\"content\":\"model overloaded\"}\n"]),
                &mut transcript,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FinchatError::Stream(ref m) if m == "model overloaded"));
    }

    #[tokio::test]
    async fn cancelled_token_stops_reading() {
        let mut driver = StreamDriver::default();
        let mut transcript = Transcript::default();
        let token = CancellationToken::new();
        token.cancel();
        let summary = driver
            .drive(
                chunks(&["data: {\"type\":\"token\",\"content\":\"Hi\"}\n"]),
                &mut transcript,
                Some(&token),
            )
            .await
            .unwrap();
        assert!(!summary.completed);
        assert_eq!(transcript.text, "");
    }

    #[tokio::test(start_paused = true)]
    async fn silent_stream_times_out() {
        let mut driver = StreamDriver::default().with_idle_timeout(Duration::from_secs(5));
        let mut transcript = Transcript::default();
        let stream = chunks(&["data: {\"type\":\"token\",\"content\":\"Hi\"}\n"])
            .chain(futures::stream::pending());
        let err = driver.drive(stream, &mut transcript, None).await.unwrap_err();

        assert!(matches!(err, FinchatError::Timeout(5000)));
        assert_eq!(transcript.text, "Hi");
        assert_eq!(driver.session().text(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stream_outlives_idle_timeout() {
        let mut driver = StreamDriver::default().with_idle_timeout(Duration::from_secs(5));
        let mut transcript = Transcript::default();
        let stream = async_stream::stream! {
            for part in ["Q3 ", "revenue ", "rose."] {
                tokio::time::sleep(Duration::from_secs(4)).await;
                yield Ok::<_, FinchatError>(format!("data: {{\"type\":\"token\",\"content\":\"{part}\"}}\n"));
            }
            yield Ok("data: [DONE]\n".to_string());
        };
        let summary = driver.drive(stream, &mut transcript, None).await.unwrap();

        assert!(summary.completed);
        assert_eq!(summary.text, "Q3 revenue rose.");
    }
}
