//! Core logic for the assistant chat: the conversation session store
//! and the quick-reply option extractor.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod session;
pub mod suggest;

pub use session::{ChatSession, SessionStage, SubmitError};
pub use suggest::{MAX_SUGGESTIONS, SuggestionOption, extract_options};
