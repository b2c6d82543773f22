//! Routes typed events to the session and the injected callbacks.

use super::session::StreamSession;
use crate::normalize::PayloadNormalizer;
use crate::types::{SessionSummary, StreamEvent, ToolCall, ToolResult};

/// Sink for everything a stream produces. The caller owns state updates;
/// `on_token` receives only the delta.
pub trait StreamCallbacks {
    fn on_token(&mut self, delta: &str);
    fn on_tool_call(&mut self, call: ToolCall);
    fn on_tool_result(&mut self, result: ToolResult);
}

impl<T: StreamCallbacks + ?Sized> StreamCallbacks for &mut T {
    fn on_token(&mut self, delta: &str) {
        (**self).on_token(delta);
    }

    fn on_tool_call(&mut self, call: ToolCall) {
        (**self).on_tool_call(call);
    }

    fn on_tool_result(&mut self, result: ToolResult) {
        (**self).on_tool_result(result);
    }
}

/// [`StreamCallbacks`] built from three closures.
pub struct FnCallbacks<T, C, R> {
    on_token: T,
    on_tool_call: C,
    on_tool_result: R,
}

impl<T, C, R> FnCallbacks<T, C, R>
where
    T: FnMut(&str),
    C: FnMut(ToolCall),
    R: FnMut(ToolResult),
{
    pub fn new(on_token: T, on_tool_call: C, on_tool_result: R) -> Self {
        Self {
            on_token,
            on_tool_call,
            on_tool_result,
        }
    }
}

impl<T, C, R> StreamCallbacks for FnCallbacks<T, C, R>
where
    T: FnMut(&str),
    C: FnMut(ToolCall),
    R: FnMut(ToolResult),
{
    fn on_token(&mut self, delta: &str) {
        (self.on_token)(delta);
    }

    fn on_tool_call(&mut self, call: ToolCall) {
        (self.on_tool_call)(call);
    }

    fn on_tool_result(&mut self, result: ToolResult) {
        (self.on_tool_result)(result);
    }
}

/// Callbacks that simply record what happened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
}

impl StreamCallbacks for Transcript {
    fn on_token(&mut self, delta: &str) {
        self.text.push_str(delta);
    }

    fn on_tool_call(&mut self, call: ToolCall) {
        self.tool_calls.push(call);
    }

    fn on_tool_result(&mut self, result: ToolResult) {
        self.tool_results.push(result);
    }
}

/// What the caller should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Keep reading.
    Continue,
    /// `StreamDone` was seen; the session has been reset.
    Finished(SessionSummary),
    /// The backend reported an error in-band. The session is left as is so
    /// the caller can end it.
    Failed(String),
}

/// Stateless router; all per-stream state lives in [`StreamSession`].
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    normalizer: PayloadNormalizer,
}

impl Dispatcher {
    pub fn new(normalizer: PayloadNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn dispatch<C>(
        &self,
        session: &mut StreamSession,
        event: StreamEvent,
        callbacks: &mut C,
    ) -> DispatchOutcome
    where
        C: StreamCallbacks + ?Sized,
    {
        match event {
            StreamEvent::Token { text } => {
                if !text.is_empty() {
                    session.push_delta(&text);
                    callbacks.on_token(&text);
                }
            }
            StreamEvent::AssistantText { text } => push_message_text(session, &text, callbacks),
            StreamEvent::ToolCallRequested { preamble, calls } => {
                if let Some(text) = preamble {
                    push_message_text(session, &text, callbacks);
                }
                for call in calls {
                    if !session.registry_mut().register(&call.id) {
                        tracing::debug!(id = %call.id, "ignoring duplicate tool call");
                        continue;
                    }
                    let position = call.position.unwrap_or_else(|| session.position());
                    callbacks.on_tool_call(ToolCall {
                        id: call.id,
                        name: call.name,
                        arguments: call.arguments,
                        position,
                    });
                }
            }
            StreamEvent::ToolCallResult {
                tool_call_id,
                payload,
            } => {
                let orphaned = !session.registry().has_seen(&tool_call_id);
                if orphaned {
                    tracing::debug!(id = %tool_call_id, "tool result without matching call");
                }
                callbacks.on_tool_result(ToolResult {
                    payload: self.normalizer.normalize(&payload),
                    tool_call_id,
                    orphaned,
                });
            }
            StreamEvent::StreamDone => return DispatchOutcome::Finished(session.end(true)),
            StreamEvent::ServerError { message } => {
                tracing::warn!(error = %message, "stream reported an error");
                return DispatchOutcome::Failed(message);
            }
            StreamEvent::Unparseable => {}
        }
        DispatchOutcome::Continue
    }
}

/// Full `ai` message text. With token streaming the same text already
/// arrived as deltas.
fn push_message_text<C>(session: &mut StreamSession, text: &str, callbacks: &mut C)
where
    C: StreamCallbacks + ?Sized,
{
    if text.is_empty() || session.streamed_deltas() {
        return;
    }
    session.push_token(text);
    callbacks.on_token(text);
}

/// Dispatch with the default normalizer.
pub fn dispatch<C>(session: &mut StreamSession, event: StreamEvent, callbacks: &mut C) -> DispatchOutcome
where
    C: StreamCallbacks + ?Sized,
{
    Dispatcher::default().dispatch(session, event, callbacks)
}
