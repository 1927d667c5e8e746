//! Client-side commerce state for the storefront: the shopping cart,
//! favorites, the login rate limiter, and the PC-build configurator.
//!
//! Every store here follows the same shape: an explicitly owned state
//! object, mutated only on the single event-processing path, with an
//! observer list that republishes the state to renderers after every
//! mutation. Server-side persistence is a boundary collaborator behind
//! a backend trait; the stores only reconcile with it.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod cart;
pub mod configurator;
pub mod favorites;
pub mod rate_limit;

pub use cart::{BackendError, CartBackend, CartItem, CartStore};
pub use configurator::{
    BuildConfigurator, CompatIssue, Component, ComponentKind, FormFactor,
    ShareCodeError,
};
pub use favorites::{FavoritesBackend, FavoritesStore};
pub use rate_limit::{LoginRateLimiter, RateLimited};
