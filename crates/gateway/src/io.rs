//! Byte-level transport: chunk adapter, line reader, and the SSE
//! line classifier.

mod chunks;
mod lines;
mod sse;

pub(crate) use chunks::{Chunks, Error as ChunksError};
pub(crate) use lines::Lines;
pub use sse::{StreamEvent, parse_line};
