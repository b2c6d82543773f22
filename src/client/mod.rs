//! Chat-streaming transport.

pub mod http;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::FinchatConfig;
use crate::error::{FinchatError, Result};
use crate::stream::{parse, ChunkDecoder, StreamCallbacks, StreamDriver, Transcript};
use crate::types::{ChatRequest, ChatTurn, SessionSummary, StreamEvent};

use self::http::{build_client, status_to_error, stream_headers};

/// Posts chat requests and drives the streamed reply.
///
/// The client is cheap to share; every call gets its own
/// [`StreamDriver`], so concurrent requests never share session state.
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: FinchatConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: FinchatConfig) -> Result<Self> {
        config.validate()?;
        let http = build_client(&config)?;
        Ok(Self { config, http })
    }

    /// Build from the layered default configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(FinchatConfig::load(None)?)
    }

    pub fn config(&self) -> &FinchatConfig {
        &self.config
    }

    async fn send(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        if request.message.trim().is_empty() {
            return Err(FinchatError::InvalidArgument("message must not be empty".into()));
        }

        let url = self.config.stream_url();
        debug!(
            url = %url,
            thread_id = request.thread_id.as_deref().unwrap_or("-"),
            stream_tokens = request.stream_tokens,
            "chat stream request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(stream_headers(&self.config)?)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), retry_after.as_deref(), &body_text));
        }
        Ok(resp)
    }

    /// Send `request` and feed the reply to `callbacks` until the stream ends.
    pub async fn stream_chat<C>(&self, request: &ChatRequest, callbacks: &mut C) -> Result<SessionSummary>
    where
        C: StreamCallbacks + ?Sized,
    {
        self.run(request, callbacks, None).await
    }

    /// Like [`stream_chat`](Self::stream_chat), but stops reading as soon as
    /// `cancel` fires and returns an incomplete summary.
    pub async fn stream_chat_with_cancel<C>(
        &self,
        request: &ChatRequest,
        callbacks: &mut C,
        cancel: &CancellationToken,
    ) -> Result<SessionSummary>
    where
        C: StreamCallbacks + ?Sized,
    {
        self.run(request, callbacks, Some(cancel)).await
    }

    async fn run<C>(
        &self,
        request: &ChatRequest,
        callbacks: &mut C,
        cancel: Option<&CancellationToken>,
    ) -> Result<SessionSummary>
    where
        C: StreamCallbacks + ?Sized,
    {
        let resp = self.send(request).await?;
        let mut driver = StreamDriver::from_config(&self.config);
        driver.drive(resp.bytes_stream(), callbacks, cancel).await
    }

    /// Run a request to completion and return the turn to append to the
    /// conversation. Failures become the single fallback error message.
    pub async fn complete(&self, request: &ChatRequest) -> (ChatTurn, Transcript) {
        let mut transcript = Transcript::default();
        let result = self.stream_chat(request, &mut transcript).await;
        let turn = ChatTurn::from_result(result, transcript.tool_calls.clone());
        (turn, transcript)
    }

    /// Raw typed events, for callers that want a `Stream` rather than
    /// callbacks. No session state is applied: duplicates and positions are
    /// left to the consumer.
    pub async fn events(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let resp = self.send(request).await?;
        let byte_stream = resp.bytes_stream();
        let decoder_config = self.config.decoder.clone();

        let stream = async_stream::stream! {
            let mut decoder = ChunkDecoder::with_config(decoder_config);
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(FinchatError::Network(e));
                        break;
                    }
                };

                let mut done = false;
                for record in decoder.feed(&chunk) {
                    if let Some(event) = parse(&record) {
                        done = event == StreamEvent::StreamDone;
                        yield Ok(event);
                        if done {
                            break;
                        }
                    }
                }
                if done {
                    break;
                }
            }
            decoder.finish();
        };

        Ok(Box::pin(stream))
    }
}
