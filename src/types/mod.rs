//! Core types for finchat.

pub mod message;
pub mod payload;
pub mod stream;

pub use message::*;
pub use payload::*;
pub use stream::*;
