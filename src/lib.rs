//! finchat: streaming chat-response core for the financial assistant.
//!
//! Consumes the chunked reply of the chat-streaming endpoint and turns it
//! into three callbacks: assistant token deltas, tool-call registrations, and
//! tool results with a normalized side-panel payload.
//!
//! # Quick Start
//!
//! ```no_run
//! use finchat::prelude::*;
//!
//! # async fn example() -> finchat::error::Result<()> {
//! let client = ChatClient::from_env()?;
//! let mut transcript = Transcript::default();
//! let request = ChatRequest::new("How did operating margin change in Q3?");
//! let summary = client.stream_chat(&request, &mut transcript).await?;
//! println!("{}", summary.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod prelude;
pub mod stream;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
