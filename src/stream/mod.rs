//! Streaming chat-response core.
//!
//! Data flows one way: raw bytes go through the [`ChunkDecoder`], each
//! record through [`parse`], and each event through the [`Dispatcher`],
//! which updates the [`StreamSession`] and calls back into the caller.
//!
//! ```
//! use finchat::stream::{StreamDriver, Transcript};
//!
//! let mut driver = StreamDriver::default();
//! let mut transcript = Transcript::default();
//! driver.push("data: {\"type\":\"token\",\"content\":\"Hel\"}\n", &mut transcript)?;
//! let summary = driver
//!     .push("data: {\"type\":\"token\",\"content\":\"lo\"}\ndata: [DONE]\n", &mut transcript)?
//!     .expect("stream finished");
//! assert_eq!(summary.text, "Hello");
//! # Ok::<(), finchat::error::FinchatError>(())
//! ```

pub mod decoder;
pub mod dispatcher;
pub mod driver;
pub mod parser;
pub mod registry;
pub mod session;

pub use decoder::{ChunkDecoder, DecoderConfig};
pub use dispatcher::{dispatch, DispatchOutcome, Dispatcher, FnCallbacks, StreamCallbacks, Transcript};
pub use driver::StreamDriver;
pub use parser::parse;
pub use registry::ToolCallRegistry;
pub use session::StreamSession;
