//! CLI command handlers for chat and replay.

use std::io::Write;
use std::path::Path;

use crate::client::ChatClient;
use crate::config::FinchatConfig;
use crate::error::{FinchatError, Result};
use crate::stream::{StreamCallbacks, StreamDriver};
use crate::types::{ChatRequest, NormalizedPayload, SessionSummary, ToolCall, ToolResult, FALLBACK_ERROR_TEXT};

use super::{ChatArgs, ReplayArgs};

const PREVIEW_LIMIT: usize = 200;

/// Writes tokens to `out` and tool activity to `err`.
pub struct TerminalPrinter<O: Write, E: Write> {
    out: O,
    err: E,
    json: bool,
    write_failed: bool,
}

impl<O: Write, E: Write> TerminalPrinter<O, E> {
    pub fn new(out: O, err: E, json: bool) -> Self {
        Self {
            out,
            err,
            json,
            write_failed: false,
        }
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Whether any write failed, e.g. because stdout was closed.
    pub fn write_failed(&self) -> bool {
        self.write_failed
    }

    fn check(&mut self, result: std::io::Result<()>) {
        if let Err(e) = result {
            if !self.write_failed {
                tracing::debug!(error = %e, "terminal write failed");
            }
            self.write_failed = true;
        }
    }
}

impl<O: Write, E: Write> StreamCallbacks for TerminalPrinter<O, E> {
    fn on_token(&mut self, delta: &str) {
        let result = write!(self.out, "{delta}").and_then(|()| self.out.flush());
        self.check(result);
    }

    fn on_tool_call(&mut self, call: ToolCall) {
        let result = writeln!(self.err, "\n> {} ({}) at {}", call.name, call.id, call.position);
        self.check(result);
    }

    fn on_tool_result(&mut self, result: ToolResult) {
        if self.json {
            let line = serde_json::to_string(&result).unwrap_or_default();
            let written = writeln!(self.err, "{line}");
            self.check(written);
            return;
        }
        let (mark, body) = match &result.payload {
            NormalizedPayload::Error { message } => ("x", message.clone()),
            NormalizedPayload::Structured { data } => ("ok", data.to_string()),
            NormalizedPayload::Text { text } => ("ok", text.clone()),
        };
        let orphan = if result.orphaned { " (unmatched)" } else { "" };
        let written = writeln!(
            self.err,
            "  [{mark}] {}{orphan}: {}",
            result.tool_call_id,
            preview(&body)
        );
        self.check(written);
    }
}

/// Cut `text` to at most [`PREVIEW_LIMIT`] bytes on a char boundary.
fn preview(text: &str) -> String {
    if text.len() <= PREVIEW_LIMIT {
        return text.to_string();
    }
    let mut end = PREVIEW_LIMIT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Handle `finchat chat <message>`.
pub async fn handle_chat(config_path: Option<&Path>, args: ChatArgs) -> Result<()> {
    let config = FinchatConfig::load(config_path)?;
    let stream_tokens = config.stream_tokens && !args.no_stream_tokens;
    let client = ChatClient::new(config)?;

    let mut request = ChatRequest::new(args.message).with_stream_tokens(stream_tokens);
    if let Some(thread_id) = args.thread_id {
        request = request.in_thread(thread_id);
    }

    let mut printer = TerminalPrinter::new(std::io::stdout(), std::io::stderr(), args.json);
    match client.stream_chat(&request, &mut printer).await {
        Ok(summary) => {
            println!();
            report_incomplete(&summary);
            Ok(())
        }
        Err(e) if e.is_transport() => {
            tracing::error!(error = %e, "chat stream failed");
            println!("\n{FALLBACK_ERROR_TEXT}");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Handle `finchat replay <file>`.
pub async fn handle_replay(config_path: Option<&Path>, args: ReplayArgs) -> Result<()> {
    let config = FinchatConfig::load(config_path)?;
    let body = tokio::fs::read(&args.file).await?;

    let mut printer = TerminalPrinter::new(std::io::stdout(), std::io::stderr(), args.json);
    let summary = replay(&config, &body, args.chunk_size, &mut printer)?;
    println!();
    report_incomplete(&summary);
    Ok(())
}

/// Feed `body` through a fresh driver in reads of `chunk_size` bytes.
pub fn replay<C>(config: &FinchatConfig, body: &[u8], chunk_size: usize, callbacks: &mut C) -> Result<SessionSummary>
where
    C: StreamCallbacks + ?Sized,
{
    if chunk_size == 0 {
        return Err(FinchatError::InvalidArgument("chunk size must be at least 1".into()));
    }

    let mut driver = StreamDriver::from_config(config);
    for piece in body.chunks(chunk_size) {
        if let Some(summary) = driver.push(piece, callbacks)? {
            return Ok(summary);
        }
    }
    Ok(driver.finish())
}

fn report_incomplete(summary: &SessionSummary) {
    if !summary.completed {
        eprintln!("(stream ended without a done marker)");
    }
}
