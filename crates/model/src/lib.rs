//! An abstraction layer for the hosted chat gateway.
//!
//! This crate establishes a unified protocol for the assistant session
//! to talk to the LLM gateway, so that the session logic can be
//! exercised against a fake provider in tests and switched to another
//! gateway without modifying the session codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod credentials;
mod error;
mod provider;
mod request;
mod stream;

pub use credentials::*;
pub use error::*;
pub use provider::*;
pub use request::*;
pub use stream::*;
