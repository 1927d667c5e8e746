use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ChatRequest;
use crate::stream::ChatStream;

/// The error type for a chat gateway provider.
pub trait GatewayError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a chat gateway provider, which is an entry
/// for sending completion requests to the hosted LLM endpoint.
///
/// Once the provider is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not
/// rely on it, and the provider should be prepared for being dropped
/// anytime.
pub trait ChatProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: GatewayError;

    /// The streaming response type for this provider.
    type Stream: ChatStream<Error = Self::Error>;

    /// Sends a request to the gateway.
    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static;
}
