//! An out-of-the-box engine for the storefront: the assistant chat
//! wired to a gateway provider, plus the client-side commerce stores.
//!
//! Host apps embed this crate as a library; the rendering layer stays
//! on the host side and observes state through the update callbacks.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod assistant;

pub use assistant::{Assistant, AssistantBuilder};

/// Re-exports of the [`voltcart_core`] crate.
pub mod core {
    pub use voltcart_core::*;
}

/// Re-exports of the [`voltcart_commerce`] crate.
pub mod commerce {
    pub use voltcart_commerce::*;
}

/// Re-exports of the [`voltcart_gateway`] crate.
pub mod gateway {
    pub use voltcart_gateway::*;
}
